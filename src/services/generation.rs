use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Duration, NaiveDate};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::{Client, ClientSession};
use serde::{Deserialize, Serialize};

use crate::db::mongo::{
    ACTIVITIES_COLLECTION, DATABASE, INTERACTIONS_COLLECTION, ITINERARY_COLLECTION,
    TRAINING_COLLECTION,
};
use crate::models::activity::ActivityCandidate;
use crate::models::interaction::InteractionEvent;
use crate::models::persona::PersonaSeed;
use crate::models::slot::ItineraryEntry;
use crate::models::training::{PersonaSnapshot, TrainingRecord};
use crate::services::candidate_selector::{GreedyCapSelector, SelectionStrategy};
use crate::services::climate::ClimateDescriptor;
use crate::services::enrichment::{EnrichmentService, SlotSummary};
use crate::services::node_scorer::NodeScorer;
use crate::services::persona_context::PersonaContextService;
use crate::services::slot_placer::{PlacedSlot, SlotPlacer};

const DEFAULT_CATALOG_LIMIT: i64 = 200;

pub const MODEL_ID: &str = "greedy-slot-ranker";
pub const MODEL_VERSION: &str = "2025.07";

#[derive(Clone)]
pub struct GenerationConfig {
    /// Upper bound on catalog rows considered per leg
    pub catalog_limit: i64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            catalog_limit: DEFAULT_CATALOG_LIMIT,
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            catalog_limit: std::env::var("GENERATION_CATALOG_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.catalog_limit),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Seeded,
    Empty,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LegGenerationResult {
    pub leg_id: ObjectId,
    pub slots_created: u32,
    pub source: GenerationSource,
}

impl LegGenerationResult {
    pub fn empty(leg_id: ObjectId) -> Self {
        Self {
            leg_id,
            slots_created: 0,
            source: GenerationSource::Empty,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TripGenerationResult {
    pub total_slots_created: u32,
    pub leg_results: Vec<LegGenerationResult>,
}

impl TripGenerationResult {
    pub fn from_legs(leg_results: Vec<LegGenerationResult>) -> Self {
        let total_slots_created = leg_results.iter().map(|r| r.slots_created).sum();
        Self {
            total_slots_created,
            leg_results,
        }
    }
}

/// One contiguous single-destination segment of a trip
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TripLeg {
    pub leg_id: ObjectId,
    pub destination_id: String,
    pub position: u32,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

impl TripLeg {
    pub fn length_days(&self) -> u32 {
        (self.departure - self.arrival).num_days().max(1) as u32
    }
}

pub struct GenerationEngine {
    client: Arc<Client>,
    config: GenerationConfig,
    scorer: NodeScorer,
    selector: Box<dyn SelectionStrategy>,
    placer: SlotPlacer,
    persona_context: PersonaContextService,
    enrichment: Option<EnrichmentService>,
}

impl GenerationEngine {
    pub fn new(client: Arc<Client>) -> Self {
        // Enrichment is optional; without credentials the itinerary simply
        // ships without narrative hints
        let enrichment = match EnrichmentService::new() {
            Ok(service) => Some(service),
            Err(e) => {
                log::warn!("EnrichmentService not available: {}. Itineraries will not be enriched.", e);
                None
            }
        };

        Self {
            persona_context: PersonaContextService::new(client.clone()),
            client,
            config: GenerationConfig::from_env(),
            scorer: NodeScorer::new(),
            selector: Box::new(GreedyCapSelector::new()),
            placer: SlotPlacer::new(),
            enrichment,
        }
    }

    pub fn with_config(client: Arc<Client>, config: GenerationConfig) -> Self {
        let enrichment = EnrichmentService::new().ok();

        Self {
            persona_context: PersonaContextService::new(client.clone()),
            client,
            config,
            scorer: NodeScorer::new(),
            selector: Box::new(GreedyCapSelector::new()),
            placer: SlotPlacer::new(),
            enrichment,
        }
    }

    /// Generate every leg of a trip strictly in position order. A leg that
    /// fails is logged and recorded as an empty result so its siblings
    /// still generate.
    pub async fn generate_trip(
        &self,
        trip_id: ObjectId,
        traveler_id: ObjectId,
        mut legs: Vec<TripLeg>,
        seed: &PersonaSeed,
    ) -> TripGenerationResult {
        legs.sort_by_key(|leg| leg.position);

        let mut leg_results = Vec::with_capacity(legs.len());

        for leg in &legs {
            match self.generate_leg(trip_id, traveler_id, leg, seed).await {
                Ok(result) => leg_results.push(result),
                Err(e) => {
                    log::error!(
                        "Generation failed for leg {} ({}): {}",
                        leg.leg_id,
                        leg.destination_id,
                        e
                    );
                    leg_results.push(LegGenerationResult::empty(leg.leg_id));
                }
            }
        }

        TripGenerationResult::from_legs(leg_results)
    }

    /// Generate one leg: score the destination catalog, select under the
    /// category cap, place into day/time slots, and commit the itinerary
    /// rows, the feedback event, and the per-day training records in one
    /// transaction. Hands off to enrichment after the commit without
    /// waiting for it.
    pub async fn generate_leg(
        &self,
        trip_id: ObjectId,
        traveler_id: ObjectId,
        leg: &TripLeg,
        seed: &PersonaSeed,
    ) -> Result<LegGenerationResult, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let total_days = leg.length_days();

        let candidates = self.fetch_candidates(&leg.destination_id).await?;
        if candidates.is_empty() {
            // Expected state for an unseeded destination
            log::info!("No catalog for destination {}; leg {} left empty", leg.destination_id, leg.leg_id);
            return Ok(LegGenerationResult::empty(leg.leg_id));
        }

        let context = self
            .persona_context
            .load(traveler_id, &leg.destination_id, leg.arrival.month(), seed.clone())
            .await?;

        let slots_per_day = SlotPlacer::effective_slots_per_day(seed, total_days);
        let target = (slots_per_day * total_days) as usize;

        let pool_ids: Vec<ObjectId> = candidates.iter().filter_map(|c| c.id).collect();

        let scored = self.scorer.score(candidates, seed, &context.implicit);
        let ranked = self.selector.select(&scored, target);
        if ranked.is_empty() {
            return Ok(LegGenerationResult::empty(leg.leg_id));
        }

        let ranked_ids: Vec<ObjectId> = ranked.iter().filter_map(|c| c.activity.id).collect();
        let placed = self.placer.place(ranked, total_days, seed);

        let entries = build_entries(trip_id, leg.leg_id, leg.arrival, &placed);
        let feedback = build_feedback(traveler_id, trip_id, leg.leg_id, &placed);
        let records = build_training_records(
            trip_id,
            leg.leg_id,
            traveler_id,
            &leg.destination_id,
            &pool_ids,
            &ranked_ids,
            &entries,
            PersonaSnapshot::capture(seed, &context.implicit),
            context.climate.clone(),
            started.elapsed().as_millis() as i64,
        );

        self.persist_generation(&entries, &feedback, &records).await?;

        let slots_created = entries.len() as u32;
        log::info!(
            "Leg {} generated: {} slots across {} days in {}ms",
            leg.leg_id,
            slots_created,
            total_days,
            started.elapsed().as_millis()
        );

        self.spawn_enrichment(trip_id, seed, &leg.destination_id, &placed, &entries);

        Ok(LegGenerationResult {
            leg_id: leg.leg_id,
            slots_created,
            source: GenerationSource::Seeded,
        })
    }

    async fn fetch_candidates(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ActivityCandidate>, mongodb::error::Error> {
        let collection: mongodb::Collection<ActivityCandidate> = self
            .client
            .database(DATABASE)
            .collection(ACTIVITIES_COLLECTION);

        let cursor = collection
            .find(doc! { "destination_id": destination_id })
            .limit(self.config.catalog_limit)
            .await?;

        let candidates: Vec<ActivityCandidate> = cursor.try_collect().await?;
        log::info!(
            "Loaded {} candidates for destination {}",
            candidates.len(),
            destination_id
        );
        Ok(candidates)
    }

    /// All-or-nothing write: itinerary rows, the feedback event, and the
    /// training records either all commit or none do
    async fn persist_generation(
        &self,
        entries: &[ItineraryEntry],
        feedback: &InteractionEvent,
        records: &[TrainingRecord],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        if let Err(e) = self
            .insert_generation_rows(&mut session, entries, feedback, records)
            .await
        {
            if let Err(abort_err) = session.abort_transaction().await {
                log::warn!("Failed to abort generation transaction: {}", abort_err);
            }
            return Err(e.into());
        }

        session.commit_transaction().await?;
        Ok(())
    }

    async fn insert_generation_rows(
        &self,
        session: &mut ClientSession,
        entries: &[ItineraryEntry],
        feedback: &InteractionEvent,
        records: &[TrainingRecord],
    ) -> Result<(), mongodb::error::Error> {
        let db = self.client.database(DATABASE);

        db.collection::<ItineraryEntry>(ITINERARY_COLLECTION)
            .insert_many(entries)
            .session(&mut *session)
            .await?;

        db.collection::<InteractionEvent>(INTERACTIONS_COLLECTION)
            .insert_one(feedback)
            .session(&mut *session)
            .await?;

        db.collection::<TrainingRecord>(TRAINING_COLLECTION)
            .insert_many(records)
            .session(&mut *session)
            .await?;

        Ok(())
    }

    /// Detached task; the caller never observes enrichment latency or
    /// failure
    fn spawn_enrichment(
        &self,
        trip_id: ObjectId,
        seed: &PersonaSeed,
        destination_id: &str,
        placed: &[PlacedSlot],
        entries: &[ItineraryEntry],
    ) {
        let Some(enrichment) = self.enrichment.clone() else {
            return;
        };

        let summaries: Vec<SlotSummary> = placed
            .iter()
            .zip(entries.iter())
            .filter_map(|(slot, entry)| {
                entry.id.map(|id| SlotSummary {
                    id: id.to_hex(),
                    name: slot.activity.title.clone(),
                    category: slot.activity.category,
                    day: slot.day,
                    position: slot.position,
                    coordinates: slot.activity.coordinates,
                })
            })
            .collect();

        let db = self.client.clone();
        let persona_text = format!("{} Visiting {}.", seed.render_text(), destination_id);

        tokio::spawn(async move {
            enrichment.enrich(db, trip_id, summaries, persona_text).await;
        });
    }
}

pub fn build_entries(
    trip_id: ObjectId,
    leg_id: ObjectId,
    trip_start: NaiveDate,
    placed: &[PlacedSlot],
) -> Vec<ItineraryEntry> {
    placed
        .iter()
        .map(|slot| {
            let date = trip_start + Duration::days(slot.day as i64 - 1);
            let starts_at = date.and_time(slot.start_time).and_utc();
            let ends_at = starts_at + Duration::minutes(slot.duration_minutes);

            ItineraryEntry {
                id: Some(ObjectId::new()),
                trip_id,
                leg_id,
                activity_id: slot.activity.id.unwrap_or_else(ObjectId::new),
                day: slot.day,
                position: slot.position,
                kind: slot.kind,
                starts_at: DateTime::from_millis(starts_at.timestamp_millis()),
                ends_at: DateTime::from_millis(ends_at.timestamp_millis()),
                duration_minutes: slot.duration_minutes,
                narrative_hint: None,
                created_at: Some(DateTime::now()),
                updated_at: Some(DateTime::now()),
            }
        })
        .collect()
}

fn build_feedback(
    traveler_id: ObjectId,
    trip_id: ObjectId,
    leg_id: ObjectId,
    placed: &[PlacedSlot],
) -> InteractionEvent {
    let categories: HashSet<&'static str> = placed
        .iter()
        .map(|slot| slot.activity.category.as_str())
        .collect();
    let mut categories: Vec<String> = categories.into_iter().map(String::from).collect();
    categories.sort();

    InteractionEvent::generation_feedback(
        traveler_id,
        trip_id,
        leg_id,
        categories,
        placed.len() as u32,
    )
}

/// One record per day touched by this run. Every record carries the full
/// candidate pool and the run's ranked list, so
/// `selected_ids ⊆ ranked_ids ⊆ candidate_ids` holds per day.
#[allow(clippy::too_many_arguments)]
pub fn build_training_records(
    trip_id: ObjectId,
    leg_id: ObjectId,
    traveler_id: ObjectId,
    destination_id: &str,
    candidate_ids: &[ObjectId],
    ranked_ids: &[ObjectId],
    entries: &[ItineraryEntry],
    persona: PersonaSnapshot,
    climate: ClimateDescriptor,
    latency_ms: i64,
) -> Vec<TrainingRecord> {
    let run_id = uuid::Uuid::new_v4().to_string();

    let mut by_day: BTreeMap<u32, Vec<&ItineraryEntry>> = BTreeMap::new();
    for entry in entries {
        by_day.entry(entry.day).or_default().push(entry);
    }

    by_day
        .into_iter()
        .map(|(day, mut day_entries)| {
            day_entries.sort_by_key(|e| e.position);
            let selected_ids = day_entries.iter().map(|e| e.activity_id).collect();

            TrainingRecord {
                id: Some(ObjectId::new()),
                run_id: run_id.clone(),
                trip_id,
                leg_id,
                traveler_id,
                destination_id: destination_id.to_string(),
                day,
                candidate_ids: candidate_ids.to_vec(),
                ranked_ids: ranked_ids.to_vec(),
                selected_ids,
                model_id: MODEL_ID.to_string(),
                model_version: MODEL_VERSION.to_string(),
                latency_ms,
                persona: persona.clone(),
                climate: climate.clone(),
                created_at: Some(DateTime::now()),
            }
        })
        .collect()
}
