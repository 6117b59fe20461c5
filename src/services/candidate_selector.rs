use std::collections::HashMap;

use crate::models::activity::ActivityCategory;
use crate::services::node_scorer::ScoredCandidate;

/// Selection is kept behind a trait so a constraint-solver implementation
/// could replace the greedy pass without touching the scorer or placer.
pub trait SelectionStrategy: Send + Sync {
    fn select(&self, scored: &[ScoredCandidate], target: usize) -> Vec<ScoredCandidate>;
}

#[derive(Default)]
pub struct GreedyCapSelector;

impl GreedyCapSelector {
    pub fn new() -> Self {
        Self
    }

    /// No category may supply more than roughly one third of the itinerary
    pub fn category_cap(target: usize) -> usize {
        target.div_ceil(3)
    }
}

impl SelectionStrategy for GreedyCapSelector {
    /// Single greedy pass over the score-sorted input. Returns fewer than
    /// `target` when the catalog is too small or too category-skewed; the
    /// caller treats a short result as a smaller itinerary, not an error.
    fn select(&self, scored: &[ScoredCandidate], target: usize) -> Vec<ScoredCandidate> {
        if target == 0 {
            return Vec::new();
        }

        let cap = Self::category_cap(target);
        let mut counts: HashMap<ActivityCategory, usize> = HashMap::new();
        let mut selected = Vec::with_capacity(target);

        for candidate in scored {
            if selected.len() == target {
                break;
            }
            let count = counts.entry(candidate.activity.category).or_insert(0);
            if *count >= cap {
                continue;
            }
            *count += 1;
            selected.push(candidate.clone());
        }

        selected
    }
}
