use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityCandidate;
use crate::models::persona::{ImplicitPreferenceSnapshot, PersonaSeed};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for template/category affinity
    pub template_weight: f64,
    /// Weight for preference-tag overlap
    pub tag_weight: f64,
    /// Weight for catalog authority
    pub authority_weight: f64,
    /// Upper bound of the tie-breaking jitter
    pub jitter_weight: f64,
    /// Flat category affinity applied when no template is set
    pub default_category_affinity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            template_weight: 0.40,
            tag_weight: 0.30,
            authority_weight: 0.15,
            jitter_weight: 0.05,
            default_category_affinity: 0.35,
        }
    }
}

impl ScoringWeights {
    /// Create weights from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            template_weight: std::env::var("SCORE_TEMPLATE_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.template_weight),
            tag_weight: std::env::var("SCORE_TAG_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tag_weight),
            authority_weight: std::env::var("SCORE_AUTHORITY_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.authority_weight),
            jitter_weight: std::env::var("SCORE_JITTER_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jitter_weight),
            default_category_affinity: std::env::var("SCORE_DEFAULT_CATEGORY_AFFINITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_category_affinity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub activity: ActivityCandidate,
    pub score: f64,
}

#[derive(Default)]
pub struct NodeScorer {
    pub weights: ScoringWeights,
}

impl NodeScorer {
    pub fn new() -> Self {
        let weights = ScoringWeights::from_env();
        log::info!("NodeScorer initialized with weights: {:?}", weights);
        Self { weights }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score every candidate against the persona and return them sorted
    /// descending. Ties are broken by a small per-call random jitter, so
    /// repeated generations with the same inputs do not produce identical
    /// itineraries.
    pub fn score(
        &self,
        candidates: Vec<ActivityCandidate>,
        seed: &PersonaSeed,
        implicit: &ImplicitPreferenceSnapshot,
    ) -> Vec<ScoredCandidate> {
        let mut rng = rand::thread_rng();

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|activity| {
                let base = self.deterministic_score(&activity, seed, implicit);
                let jitter = rng.gen::<f64>() * self.weights.jitter_weight;
                ScoredCandidate {
                    activity,
                    score: base + jitter,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored
    }

    /// Score contribution that is stable across repeated calls: template
    /// affinity, tag overlap, and authority. Jitter is added on top by
    /// `score`.
    pub fn deterministic_score(
        &self,
        activity: &ActivityCandidate,
        seed: &PersonaSeed,
        implicit: &ImplicitPreferenceSnapshot,
    ) -> f64 {
        self.score_template(activity, seed)
            + self.score_tag_overlap(activity, seed, implicit)
            + self.score_authority(activity)
    }

    fn score_template(&self, activity: &ActivityCandidate, seed: &PersonaSeed) -> f64 {
        let affinity = match &seed.template {
            Some(template) => template.category_affinity(activity.category),
            None => self.weights.default_category_affinity,
        };
        affinity * self.weights.template_weight
    }

    /// Exact tag matches count fully, substring matches at half weight,
    /// normalized by the number of distinct preference terms
    fn score_tag_overlap(
        &self,
        activity: &ActivityCandidate,
        seed: &PersonaSeed,
        implicit: &ImplicitPreferenceSnapshot,
    ) -> f64 {
        let mut terms: Vec<String> = seed
            .preference_tags
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        for term in implicit.strong_terms() {
            terms.push(term.to_string());
        }
        terms.sort();
        terms.dedup();

        if terms.is_empty() {
            return 0.0;
        }

        let mut matched = 0.0;
        for term in &terms {
            let mut best: f64 = 0.0;
            for tag in &activity.tags {
                let tag_name = tag.name.to_lowercase();
                let weight = tag.weight.clamp(0.0, 1.0);
                let value = if tag_name == *term {
                    weight
                } else if tag_name.contains(term.as_str()) || term.contains(tag_name.as_str()) {
                    weight * 0.5
                } else {
                    0.0
                };
                best = best.max(value);
            }
            matched += best;
        }

        (matched / terms.len() as f64) * self.weights.tag_weight
    }

    fn score_authority(&self, activity: &ActivityCandidate) -> f64 {
        match activity.authority_score {
            Some(authority) => authority.clamp(0.0, 1.0) * self.weights.authority_weight,
            // Neutral midpoint when the catalog has no authority signal
            None => self.weights.authority_weight * 0.5,
        }
    }
}
