use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityCategory;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TripPace {
    Packed,
    Moderate,
    Relaxed,
}

impl TripPace {
    /// Baseline placed-slot count per day before template and trip-length
    /// adjustments
    pub fn base_slots_per_day(&self) -> i64 {
        match self {
            TripPace::Packed => 5,
            TripPace::Moderate => 4,
            TripPace::Relaxed => 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WakePreference {
    Early,
    Mid,
    Late,
}

impl WakePreference {
    /// First-slot base hour; slot templates add their offsets to this
    pub fn base_hour(&self) -> u32 {
        match self {
            WakePreference::Early => 8,
            WakePreference::Mid => 9,
            WakePreference::Late => 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripTemplate {
    FoodieWeekend,
    CultureCrawl,
    OutdoorAdventure,
    NightOwl,
    FamilyTime,
    WellnessReset,
}

impl TripTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripTemplate::FoodieWeekend => "foodie_weekend",
            TripTemplate::CultureCrawl => "culture_crawl",
            TripTemplate::OutdoorAdventure => "outdoor_adventure",
            TripTemplate::NightOwl => "night_owl",
            TripTemplate::FamilyTime => "family_time",
            TripTemplate::WellnessReset => "wellness_reset",
        }
    }

    /// How strongly this template favors a category, 0.0 to 1.0
    pub fn category_affinity(&self, category: ActivityCategory) -> f64 {
        use ActivityCategory::*;
        match self {
            TripTemplate::FoodieWeekend => match category {
                Dining => 1.0,
                Drinks => 0.8,
                Experience => 0.6,
                Shopping => 0.5,
                Nightlife => 0.4,
                Culture => 0.3,
                _ => 0.2,
            },
            TripTemplate::CultureCrawl => match category {
                Culture => 1.0,
                Experience => 0.7,
                Dining => 0.5,
                Shopping => 0.5,
                Outdoors => 0.3,
                _ => 0.2,
            },
            TripTemplate::OutdoorAdventure => match category {
                Outdoors => 1.0,
                Active => 0.9,
                Experience => 0.5,
                Wellness => 0.4,
                Dining => 0.3,
                _ => 0.2,
            },
            TripTemplate::NightOwl => match category {
                Nightlife => 1.0,
                Drinks => 0.9,
                Entertainment => 0.7,
                Dining => 0.5,
                _ => 0.2,
            },
            TripTemplate::FamilyTime => match category {
                GroupActivity => 1.0,
                Entertainment => 0.8,
                Outdoors => 0.6,
                Dining => 0.5,
                Culture => 0.4,
                _ => 0.2,
            },
            TripTemplate::WellnessReset => match category {
                Wellness => 1.0,
                Outdoors => 0.6,
                Dining => 0.5,
                Culture => 0.3,
                _ => 0.2,
            },
        }
    }

    /// Adjustment applied to the pace baseline when this template is active
    pub fn pace_modifier(&self) -> i64 {
        match self {
            TripTemplate::OutdoorAdventure => 1,
            TripTemplate::WellnessReset => -1,
            _ => 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersonaSeed {
    pub pace: TripPace,
    pub wake_preference: WakePreference,
    #[serde(default)]
    pub preference_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TripTemplate>,
}

impl PersonaSeed {
    /// Compact persona description sent alongside enrichment requests
    pub fn render_text(&self) -> String {
        let mut parts = Vec::new();

        let pace_desc = match self.pace {
            TripPace::Packed => "keeps a packed schedule",
            TripPace::Moderate => "keeps a moderate schedule",
            TripPace::Relaxed => "prefers a relaxed schedule",
        };
        parts.push(pace_desc.to_string());

        let wake_desc = match self.wake_preference {
            WakePreference::Early => "starts the day early",
            WakePreference::Mid => "starts the day mid-morning",
            WakePreference::Late => "starts the day late",
        };
        parts.push(wake_desc.to_string());

        if let Some(template) = &self.template {
            parts.push(format!("planning a {} trip", template.as_str().replace('_', " ")));
        }

        if !self.preference_tags.is_empty() {
            parts.push(format!("enjoys {}", self.preference_tags.join(", ")));
        }

        if let Some(text) = &self.freeform_text {
            if !text.is_empty() {
                parts.push(text.clone());
            }
        }

        format!("Traveler {}.", parts.join("; "))
    }
}

/// Preference dimensions inferred from a traveler's interaction history.
/// Values are 0.0 to 1.0 fractions; absent dimensions mean no signal.
pub const IMPLICIT_DIMENSIONS: [&str; 6] = [
    "adventure",
    "budget_sensitivity",
    "food_focus",
    "culture_interest",
    "nature_preference",
    "nightlife_affinity",
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ImplicitPreferenceSnapshot {
    pub dimensions: HashMap<String, f64>,
}

impl ImplicitPreferenceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn fraction(&self, dimension: &str) -> f64 {
        self.dimensions.get(dimension).copied().unwrap_or(0.0)
    }

    /// Preference terms the scorer treats like stated tags, one per
    /// dimension at or above the signal threshold
    pub fn strong_terms(&self) -> Vec<&'static str> {
        let mut terms = Vec::new();
        for (dimension, keyword) in [
            ("adventure", "adventure"),
            ("budget_sensitivity", "budget"),
            ("food_focus", "food"),
            ("culture_interest", "culture"),
            ("nature_preference", "nature"),
            ("nightlife_affinity", "nightlife"),
        ] {
            if self.fraction(dimension) >= 0.5 {
                terms.push(keyword);
            }
        }
        terms
    }
}
