use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;

use crate::db::mongo::{DATABASE, INTERACTIONS_COLLECTION};
use crate::models::activity::ActivityCategory;
use crate::models::interaction::InteractionEvent;
use crate::models::persona::{ImplicitPreferenceSnapshot, PersonaSeed};
use crate::services::climate::{ClimateDescriptor, ClimateService};

const HISTORY_LIMIT: i64 = 200;

/// Everything the scorer needs about one traveler for one generation run
#[derive(Debug, Clone)]
pub struct PersonaContext {
    pub seed: PersonaSeed,
    pub implicit: ImplicitPreferenceSnapshot,
    pub climate: ClimateDescriptor,
}

pub struct PersonaContextService {
    client: Arc<Client>,
}

impl PersonaContextService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Build the scoring context: the caller-supplied seed, an implicit
    /// preference snapshot derived fresh from recent interaction history,
    /// and the destination's climate descriptor for the travel month.
    /// Read-only; nothing here mutates state.
    pub async fn load(
        &self,
        traveler_id: ObjectId,
        destination_id: &str,
        month: u32,
        seed: PersonaSeed,
    ) -> Result<PersonaContext, mongodb::error::Error> {
        let events = self.fetch_recent_interactions(traveler_id).await?;
        let implicit = Self::derive_snapshot(&events);
        let climate = ClimateService::lookup(destination_id, month);

        log::info!(
            "Persona context for traveler {}: {} history events, {} implicit dimensions",
            traveler_id,
            events.len(),
            implicit.dimensions.len()
        );

        Ok(PersonaContext {
            seed,
            implicit,
            climate,
        })
    }

    async fn fetch_recent_interactions(
        &self,
        traveler_id: ObjectId,
    ) -> Result<Vec<InteractionEvent>, mongodb::error::Error> {
        let collection: mongodb::Collection<InteractionEvent> = self
            .client
            .database(DATABASE)
            .collection(INTERACTIONS_COLLECTION);

        let cursor = collection
            .find(doc! { "traveler_id": traveler_id })
            .sort(doc! { "created_at": -1 })
            .limit(HISTORY_LIMIT)
            .await?;

        cursor.try_collect().await
    }

    /// Pattern-match positive-signal interactions into the fixed dimension
    /// set. New travelers with no history get an empty snapshot.
    pub fn derive_snapshot(events: &[InteractionEvent]) -> ImplicitPreferenceSnapshot {
        let signals: Vec<&InteractionEvent> = events
            .iter()
            .filter(|e| e.kind.is_positive_signal())
            .collect();

        if signals.is_empty() {
            return ImplicitPreferenceSnapshot::default();
        }

        let total = signals.len() as f64;
        let mut snapshot = ImplicitPreferenceSnapshot::default();

        let mut insert_fraction = |dimension: &str, count: usize| {
            if count > 0 {
                snapshot
                    .dimensions
                    .insert(dimension.to_string(), count as f64 / total);
            }
        };

        insert_fraction(
            "adventure",
            signals
                .iter()
                .filter(|e| {
                    matches!(
                        e.category,
                        Some(ActivityCategory::Active) | Some(ActivityCategory::Outdoors)
                    ) || Self::has_tag(e, &["adventure", "thrill", "extreme"])
                })
                .count(),
        );
        insert_fraction(
            "budget_sensitivity",
            signals
                .iter()
                .filter(|e| e.price_tier.map(|tier| tier <= 1).unwrap_or(false))
                .count(),
        );
        insert_fraction(
            "food_focus",
            signals
                .iter()
                .filter(|e| {
                    e.category == Some(ActivityCategory::Dining)
                        || Self::has_tag(e, &["food", "restaurant", "tasting"])
                })
                .count(),
        );
        insert_fraction(
            "culture_interest",
            signals
                .iter()
                .filter(|e| {
                    e.category == Some(ActivityCategory::Culture)
                        || Self::has_tag(e, &["museum", "history", "art"])
                })
                .count(),
        );
        insert_fraction(
            "nature_preference",
            signals
                .iter()
                .filter(|e| {
                    e.category == Some(ActivityCategory::Outdoors)
                        || Self::has_tag(e, &["nature", "park", "hike", "trail"])
                })
                .count(),
        );
        insert_fraction(
            "nightlife_affinity",
            signals
                .iter()
                .filter(|e| {
                    matches!(
                        e.category,
                        Some(ActivityCategory::Nightlife) | Some(ActivityCategory::Drinks)
                    ) || Self::has_tag(e, &["bar", "club", "night"])
                })
                .count(),
        );

        snapshot
    }

    fn has_tag(event: &InteractionEvent, needles: &[&str]) -> bool {
        event.tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            needles.iter().any(|needle| tag.contains(needle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interaction::InteractionKind;

    fn event(
        kind: InteractionKind,
        category: Option<ActivityCategory>,
        tags: &[&str],
        price_tier: Option<u8>,
    ) -> InteractionEvent {
        InteractionEvent {
            id: Some(ObjectId::new()),
            traveler_id: ObjectId::new(),
            kind,
            trip_id: None,
            leg_id: None,
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            price_tier,
            slots_created: None,
            created_at: None,
        }
    }

    #[test]
    fn test_new_traveler_gets_empty_snapshot() {
        let snapshot = PersonaContextService::derive_snapshot(&[]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_only_positive_signals_count() {
        let events = vec![
            event(InteractionKind::ViewedActivity, Some(ActivityCategory::Dining), &[], None),
            event(InteractionKind::SkippedActivity, Some(ActivityCategory::Dining), &[], None),
        ];
        let snapshot = PersonaContextService::derive_snapshot(&events);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_food_heavy_history_raises_food_focus() {
        let events = vec![
            event(InteractionKind::SavedActivity, Some(ActivityCategory::Dining), &[], None),
            event(InteractionKind::BookedActivity, Some(ActivityCategory::Dining), &[], None),
            event(InteractionKind::SavedActivity, Some(ActivityCategory::Culture), &[], None),
            event(InteractionKind::BookedActivity, Some(ActivityCategory::Dining), &[], None),
        ];
        let snapshot = PersonaContextService::derive_snapshot(&events);
        assert_eq!(snapshot.fraction("food_focus"), 0.75);
        assert_eq!(snapshot.fraction("culture_interest"), 0.25);
    }

    #[test]
    fn test_tag_matches_feed_dimensions() {
        let events = vec![event(
            InteractionKind::CompletedActivity,
            None,
            &["sunset hike"],
            None,
        )];
        let snapshot = PersonaContextService::derive_snapshot(&events);
        assert_eq!(snapshot.fraction("nature_preference"), 1.0);
    }

    #[test]
    fn test_budget_sensitivity_from_price_tiers() {
        let events = vec![
            event(InteractionKind::BookedActivity, None, &[], Some(0)),
            event(InteractionKind::BookedActivity, None, &[], Some(1)),
            event(InteractionKind::BookedActivity, None, &[], Some(3)),
            event(InteractionKind::BookedActivity, None, &[], Some(1)),
        ];
        let snapshot = PersonaContextService::derive_snapshot(&events);
        assert_eq!(snapshot.fraction("budget_sensitivity"), 0.75);
    }

    #[test]
    fn test_strong_dimensions_become_preference_terms() {
        let events = vec![
            event(InteractionKind::SavedActivity, Some(ActivityCategory::Nightlife), &[], None),
            event(InteractionKind::SavedActivity, Some(ActivityCategory::Drinks), &[], None),
        ];
        let snapshot = PersonaContextService::derive_snapshot(&events);
        assert!(snapshot.strong_terms().contains(&"nightlife"));
    }
}
