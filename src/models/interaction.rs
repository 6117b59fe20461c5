use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityCategory;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    ViewedActivity,
    SavedActivity,
    BookedActivity,
    SkippedActivity,
    CompletedActivity,
    ItineraryGenerated,
}

impl InteractionKind {
    /// Positive-signal interactions feed the implicit preference snapshot
    pub fn is_positive_signal(&self) -> bool {
        matches!(
            self,
            InteractionKind::SavedActivity
                | InteractionKind::BookedActivity
                | InteractionKind::CompletedActivity
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InteractionEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub traveler_id: ObjectId,
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_tier: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots_created: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl InteractionEvent {
    /// Implicit positive-feedback entry written alongside each successful
    /// generation
    pub fn generation_feedback(
        traveler_id: ObjectId,
        trip_id: ObjectId,
        leg_id: ObjectId,
        placed_categories: Vec<String>,
        slots_created: u32,
    ) -> Self {
        Self {
            id: Some(ObjectId::new()),
            traveler_id,
            kind: InteractionKind::ItineraryGenerated,
            trip_id: Some(trip_id),
            leg_id: Some(leg_id),
            category: None,
            tags: placed_categories,
            price_tier: None,
            slots_created: Some(slots_created),
            created_at: Some(DateTime::now()),
        }
    }
}
