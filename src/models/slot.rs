use bson::{oid::ObjectId, DateTime};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Morning,
    MiddayMeal,
    Afternoon,
    Evening,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Anchor,
    Flex,
    Meal,
}

/// Durable form of a placed slot. Created only by the generation write;
/// the enrichment pass may later adjust `position` and set
/// `narrative_hint`, nothing else touches rows from this engine.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ItineraryEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub leg_id: ObjectId,
    pub activity_id: ObjectId,
    pub day: u32,
    pub position: u32,
    pub kind: SlotKind,
    pub starts_at: DateTime,
    pub ends_at: DateTime,
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl ItineraryEntry {
    /// Day number implied by the stored start timestamp, 1-indexed from the
    /// trip start date
    pub fn derived_day(&self, trip_start: NaiveDate) -> u32 {
        let start = chrono::DateTime::from_timestamp_millis(self.starts_at.timestamp_millis())
            .map(|dt| dt.date_naive())
            .unwrap_or(trip_start);
        ((start - trip_start).num_days() + 1).max(1) as u32
    }
}
