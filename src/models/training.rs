use std::collections::HashMap;

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::persona::{ImplicitPreferenceSnapshot, PersonaSeed, TripPace, TripTemplate, WakePreference};
use crate::services::climate::ClimateDescriptor;

/// Persona context as it stood at write time, denormalized so training jobs
/// never have to re-derive it
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersonaSnapshot {
    pub pace: TripPace,
    pub wake_preference: WakePreference,
    pub preference_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TripTemplate>,
    #[serde(default)]
    pub implicit: HashMap<String, f64>,
}

impl PersonaSnapshot {
    pub fn capture(seed: &PersonaSeed, implicit: &ImplicitPreferenceSnapshot) -> Self {
        Self {
            pace: seed.pace,
            wake_preference: seed.wake_preference,
            preference_tags: seed.preference_tags.clone(),
            template: seed.template,
            implicit: implicit.dimensions.clone(),
        }
    }
}

/// One record per day per generation run, immutable once written.
/// `selected_ids` is a subset of `ranked_ids`, which is a subset of
/// `candidate_ids`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrainingRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub run_id: String,
    pub trip_id: ObjectId,
    pub leg_id: ObjectId,
    pub traveler_id: ObjectId,
    pub destination_id: String,
    pub day: u32,
    pub candidate_ids: Vec<ObjectId>,
    pub ranked_ids: Vec<ObjectId>,
    pub selected_ids: Vec<ObjectId>,
    pub model_id: String,
    pub model_version: String,
    pub latency_ms: i64,
    pub persona: PersonaSnapshot,
    pub climate: ClimateDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}
