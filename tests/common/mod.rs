use std::sync::Once;

use mongodb::bson::oid::ObjectId;
use tripforge_engine::models::activity::{ActivityCandidate, ActivityCategory, WeightedTag};
use tripforge_engine::models::persona::{PersonaSeed, TripPace, TripTemplate, WakePreference};

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn candidate(category: ActivityCategory, tags: &[&str], authority: Option<f64>) -> ActivityCandidate {
    ActivityCandidate {
        id: Some(ObjectId::new()),
        destination_id: "denver".to_string(),
        title: format!("{} spot", category.as_str()),
        description: String::new(),
        category,
        coordinates: (39.74, -104.99),
        neighborhood: "RiNo".to_string(),
        price_tier: 2,
        authority_score: authority,
        tags: tags
            .iter()
            .map(|t| WeightedTag {
                name: t.to_string(),
                weight: 1.0,
            })
            .collect(),
        created_at: None,
        updated_at: None,
    }
}

pub fn seed(pace: TripPace, template: Option<TripTemplate>, tags: &[&str]) -> PersonaSeed {
    PersonaSeed {
        pace,
        wake_preference: WakePreference::Mid,
        preference_tags: tags.iter().map(|t| t.to_string()).collect(),
        freeform_text: None,
        template,
    }
}

/// A varied catalog spanning every category
pub fn mixed_catalog(per_category: usize) -> Vec<ActivityCandidate> {
    let categories = [
        ActivityCategory::Dining,
        ActivityCategory::Drinks,
        ActivityCategory::Culture,
        ActivityCategory::Outdoors,
        ActivityCategory::Active,
        ActivityCategory::Entertainment,
        ActivityCategory::Shopping,
        ActivityCategory::Experience,
        ActivityCategory::Nightlife,
        ActivityCategory::GroupActivity,
        ActivityCategory::Wellness,
    ];

    let mut catalog = Vec::new();
    for category in categories {
        for i in 0..per_category {
            let authority = 0.3 + (i as f64 * 0.07) % 0.7;
            catalog.push(candidate(category, &[], Some(authority)));
        }
    }
    catalog
}
