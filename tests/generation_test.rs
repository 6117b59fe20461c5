mod common;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serial_test::serial;

use tripforge_engine::models::activity::ActivityCategory;
use tripforge_engine::models::persona::{ImplicitPreferenceSnapshot, TripPace, TripTemplate};
use tripforge_engine::models::training::PersonaSnapshot;
use tripforge_engine::services::candidate_selector::{GreedyCapSelector, SelectionStrategy};
use tripforge_engine::services::climate::ClimateService;
use tripforge_engine::services::generation::{
    build_entries, build_training_records, GenerationConfig, GenerationSource,
    LegGenerationResult, TripGenerationResult,
};
use tripforge_engine::services::node_scorer::NodeScorer;
use tripforge_engine::services::slot_placer::{PlacedSlot, SlotPlacer};

fn run_pipeline(
    catalog_size_per_category: usize,
    pace: TripPace,
    template: Option<TripTemplate>,
    total_days: u32,
) -> (Vec<PlacedSlot>, Vec<ObjectId>, Vec<ObjectId>, u32) {
    let seed = common::seed(pace, template, &[]);
    let catalog = common::mixed_catalog(catalog_size_per_category);
    let pool_ids: Vec<ObjectId> = catalog.iter().filter_map(|c| c.id).collect();

    let scorer = NodeScorer::default();
    let selector = GreedyCapSelector::new();
    let placer = SlotPlacer::new();

    let slots_per_day = SlotPlacer::effective_slots_per_day(&seed, total_days);
    let target = (slots_per_day * total_days) as usize;

    let scored = scorer.score(catalog, &seed, &ImplicitPreferenceSnapshot::default());
    let ranked = selector.select(&scored, target);
    let ranked_ids: Vec<ObjectId> = ranked.iter().filter_map(|c| c.activity.id).collect();
    let placed = placer.place(ranked, total_days, &seed);

    (placed, pool_ids, ranked_ids, slots_per_day)
}

#[test]
fn test_no_category_exceeds_selection_cap() {
    common::init();
    let (placed, _, _, slots_per_day) = run_pipeline(6, TripPace::Moderate, None, 3);
    let target = (slots_per_day * 3) as usize;
    let cap = GreedyCapSelector::category_cap(target);

    let mut per_category: HashMap<ActivityCategory, usize> = HashMap::new();
    for slot in &placed {
        *per_category.entry(slot.activity.category).or_insert(0) += 1;
    }

    for (category, count) in per_category {
        assert!(
            count <= cap,
            "category {:?} placed {} times, cap is {}",
            category,
            count,
            cap
        );
    }
}

#[test]
fn test_no_day_exceeds_effective_slot_count() {
    common::init();
    let (placed, _, _, slots_per_day) = run_pipeline(6, TripPace::Packed, None, 5);

    let mut per_day: HashMap<u32, u32> = HashMap::new();
    for slot in &placed {
        *per_day.entry(slot.day).or_insert(0) += 1;
    }

    for (day, count) in per_day {
        assert!(
            count <= slots_per_day,
            "day {} has {} slots, limit is {}",
            day,
            count,
            slots_per_day
        );
    }
}

#[test]
fn test_training_records_preserve_subset_chain() {
    common::init();
    let (placed, pool_ids, ranked_ids, _) = run_pipeline(5, TripPace::Moderate, None, 4);
    let trip_start = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    let trip_id = ObjectId::new();
    let leg_id = ObjectId::new();
    let entries = build_entries(trip_id, leg_id, trip_start, &placed);

    let seed = common::seed(TripPace::Moderate, None, &[]);
    let records = build_training_records(
        trip_id,
        leg_id,
        ObjectId::new(),
        "denver",
        &pool_ids,
        &ranked_ids,
        &entries,
        PersonaSnapshot::capture(&seed, &ImplicitPreferenceSnapshot::default()),
        ClimateService::lookup("denver", 9),
        42,
    );

    assert!(!records.is_empty());

    for record in &records {
        let candidates: HashSet<_> = record.candidate_ids.iter().collect();
        let ranked: HashSet<_> = record.ranked_ids.iter().collect();
        let selected: HashSet<_> = record.selected_ids.iter().collect();

        assert!(selected.is_subset(&ranked));
        assert!(ranked.is_subset(&candidates));
    }

    // One record per distinct day touched, all stamped with the same run
    let days: HashSet<u32> = entries.iter().map(|e| e.day).collect();
    assert_eq!(records.len(), days.len());
    let runs: HashSet<&String> = records.iter().map(|r| &r.run_id).collect();
    assert_eq!(runs.len(), 1);
}

#[test]
fn test_every_placed_slot_appears_in_its_day_record() {
    common::init();
    let (placed, pool_ids, ranked_ids, _) = run_pipeline(5, TripPace::Moderate, None, 3);
    let trip_start = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    let trip_id = ObjectId::new();
    let leg_id = ObjectId::new();
    let entries = build_entries(trip_id, leg_id, trip_start, &placed);

    let seed = common::seed(TripPace::Moderate, None, &[]);
    let records = build_training_records(
        trip_id,
        leg_id,
        ObjectId::new(),
        "denver",
        &pool_ids,
        &ranked_ids,
        &entries,
        PersonaSnapshot::capture(&seed, &ImplicitPreferenceSnapshot::default()),
        ClimateService::lookup("denver", 9),
        10,
    );

    let by_day: HashMap<u32, &Vec<ObjectId>> = records
        .iter()
        .map(|r| (r.day, &r.selected_ids))
        .collect();

    for entry in &entries {
        let day_selected = by_day.get(&entry.day).expect("missing day record");
        assert!(day_selected.contains(&entry.activity_id));
        assert!(ranked_ids.contains(&entry.activity_id));
    }
}

#[test]
fn test_day_number_round_trips_through_start_time() {
    common::init();
    let (placed, _, _, _) = run_pipeline(5, TripPace::Packed, None, 6);
    let trip_start = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    let entries = build_entries(ObjectId::new(), ObjectId::new(), trip_start, &placed);
    for entry in &entries {
        assert_eq!(entry.derived_day(trip_start), entry.day);
    }
}

#[test]
fn test_single_category_catalog_respects_cap() {
    common::init();
    let seed = common::seed(TripPace::Moderate, None, &[]);
    let catalog: Vec<_> = (0..12)
        .map(|_| common::candidate(ActivityCategory::Dining, &[], Some(0.5)))
        .collect();

    let scorer = NodeScorer::default();
    let selector = GreedyCapSelector::new();
    let placer = SlotPlacer::new();

    let scored = scorer.score(catalog, &seed, &ImplicitPreferenceSnapshot::default());
    let ranked = selector.select(&scored, 9);
    assert_eq!(ranked.len(), 3);

    let placed = placer.place(ranked, 3, &seed);
    assert!(placed.len() <= 3);
}

#[test]
fn test_packed_short_trip_scenario() {
    common::init();
    let seed = common::seed(TripPace::Packed, None, &[]);
    assert_eq!(SlotPlacer::effective_slots_per_day(&seed, 3), 5);
}

#[test]
fn test_relaxed_long_trip_scenario() {
    common::init();
    let seed = common::seed(TripPace::Relaxed, None, &[]);
    assert_eq!(SlotPlacer::effective_slots_per_day(&seed, 10), 2);
}

#[test]
fn test_failed_leg_aggregates_as_empty() {
    common::init();
    let failed_leg = ObjectId::new();
    let good_leg = ObjectId::new();

    let result = TripGenerationResult::from_legs(vec![
        LegGenerationResult::empty(failed_leg),
        LegGenerationResult {
            leg_id: good_leg,
            slots_created: 8,
            source: GenerationSource::Seeded,
        },
    ]);

    assert_eq!(result.total_slots_created, 8);
    assert_eq!(result.leg_results.len(), 2);
    assert_eq!(result.leg_results[0].leg_id, failed_leg);
    assert_eq!(result.leg_results[0].slots_created, 0);
    assert_eq!(result.leg_results[0].source, GenerationSource::Empty);
    assert_eq!(result.leg_results[1].source, GenerationSource::Seeded);
}

#[test]
fn test_empty_selection_yields_empty_leg_result() {
    common::init();
    let selector = GreedyCapSelector::new();
    let ranked = selector.select(&[], 12);
    assert!(ranked.is_empty());

    let result = LegGenerationResult::empty(ObjectId::new());
    assert_eq!(result.slots_created, 0);
    assert_eq!(result.source, GenerationSource::Empty);
}

#[test]
#[serial]
fn test_generation_config_env_override() {
    common::init();
    std::env::set_var("GENERATION_CATALOG_LIMIT", "50");
    let config = GenerationConfig::from_env();
    assert_eq!(config.catalog_limit, 50);
    std::env::remove_var("GENERATION_CATALOG_LIMIT");

    let config = GenerationConfig::from_env();
    assert_eq!(config.catalog_limit, GenerationConfig::default().catalog_limit);
}

#[test]
#[serial]
fn test_scoring_weights_env_override() {
    common::init();
    std::env::set_var("SCORE_TAG_WEIGHT", "0.5");
    let weights = tripforge_engine::services::node_scorer::ScoringWeights::from_env();
    assert_eq!(weights.tag_weight, 0.5);
    std::env::remove_var("SCORE_TAG_WEIGHT");
}
