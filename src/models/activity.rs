use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::slot::TimeBucket;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Dining,
    Drinks,
    Culture,
    Outdoors,
    Active,
    Entertainment,
    Shopping,
    Experience,
    Nightlife,
    GroupActivity,
    Wellness,
}

impl ActivityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::Dining => "dining",
            ActivityCategory::Drinks => "drinks",
            ActivityCategory::Culture => "culture",
            ActivityCategory::Outdoors => "outdoors",
            ActivityCategory::Active => "active",
            ActivityCategory::Entertainment => "entertainment",
            ActivityCategory::Shopping => "shopping",
            ActivityCategory::Experience => "experience",
            ActivityCategory::Nightlife => "nightlife",
            ActivityCategory::GroupActivity => "group_activity",
            ActivityCategory::Wellness => "wellness",
        }
    }

    /// Typical duration of one activity of this category, in minutes
    pub fn default_duration_minutes(&self) -> i64 {
        match self {
            ActivityCategory::Dining => 75,
            ActivityCategory::Drinks => 90,
            ActivityCategory::Culture => 105,
            ActivityCategory::Outdoors => 120,
            ActivityCategory::Active => 150,
            ActivityCategory::Entertainment => 120,
            ActivityCategory::Shopping => 90,
            ActivityCategory::Experience => 120,
            ActivityCategory::Nightlife => 120,
            ActivityCategory::GroupActivity => 120,
            ActivityCategory::Wellness => 90,
        }
    }

    /// Time-of-day pool this category is drawn from during placement
    pub fn preferred_bucket(&self) -> TimeBucket {
        match self {
            ActivityCategory::Dining => TimeBucket::MiddayMeal,
            ActivityCategory::Culture => TimeBucket::Morning,
            ActivityCategory::Outdoors => TimeBucket::Morning,
            ActivityCategory::Wellness => TimeBucket::Morning,
            ActivityCategory::Active => TimeBucket::Afternoon,
            ActivityCategory::Shopping => TimeBucket::Afternoon,
            ActivityCategory::Experience => TimeBucket::Afternoon,
            ActivityCategory::GroupActivity => TimeBucket::Afternoon,
            ActivityCategory::Drinks => TimeBucket::Evening,
            ActivityCategory::Entertainment => TimeBucket::Evening,
            ActivityCategory::Nightlife => TimeBucket::Evening,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeightedTag {
    pub name: String,
    #[serde(default = "default_tag_weight")]
    pub weight: f64,
}

fn default_tag_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ActivityCandidate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub destination_id: String,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub coordinates: (f64, f64),
    pub neighborhood: String,
    pub price_tier: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_score: Option<f64>,
    #[serde(default)]
    pub tags: Vec<WeightedTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}
