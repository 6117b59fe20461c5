use std::collections::{HashMap, VecDeque};

use chrono::{Duration, NaiveTime};

use crate::models::activity::ActivityCandidate;
use crate::models::persona::{PersonaSeed, TripPace};
use crate::models::slot::{SlotKind, TimeBucket};
use crate::services::node_scorer::ScoredCandidate;

const MIN_SLOTS_PER_DAY: i64 = 2;
const MAX_SLOTS_PER_DAY: i64 = 7;
const LONG_TRIP_DAYS: u32 = 7;

/// One ordinal position in a day shape: where it sits relative to the wake
/// hour, which time-of-day pool it prefers, and the slot kind it produces
#[derive(Debug, Clone, Copy)]
pub struct ShapeEntry {
    pub hour_offset: i64,
    pub bucket: TimeBucket,
    pub kind: SlotKind,
}

const fn entry(hour_offset: i64, bucket: TimeBucket, kind: SlotKind) -> ShapeEntry {
    ShapeEntry {
        hour_offset,
        bucket,
        kind,
    }
}

/// Two-slot shape for the most unhurried days
const UNHURRIED_DAY: [ShapeEntry; 2] = [
    entry(1, TimeBucket::Morning, SlotKind::Anchor),
    entry(9, TimeBucket::Evening, SlotKind::Flex),
];

const CLASSIC_DAY: [ShapeEntry; 3] = [
    entry(1, TimeBucket::Morning, SlotKind::Anchor),
    entry(4, TimeBucket::MiddayMeal, SlotKind::Meal),
    entry(9, TimeBucket::Evening, SlotKind::Flex),
];

const FULL_DAY: [ShapeEntry; 4] = [
    entry(0, TimeBucket::Morning, SlotKind::Anchor),
    entry(4, TimeBucket::MiddayMeal, SlotKind::Meal),
    entry(6, TimeBucket::Afternoon, SlotKind::Flex),
    entry(9, TimeBucket::Evening, SlotKind::Flex),
];

/// Full day plus a late evening flex slot
const EXTENDED_DAY: [ShapeEntry; 5] = [
    entry(0, TimeBucket::Morning, SlotKind::Anchor),
    entry(4, TimeBucket::MiddayMeal, SlotKind::Meal),
    entry(6, TimeBucket::Afternoon, SlotKind::Flex),
    entry(9, TimeBucket::Evening, SlotKind::Flex),
    entry(11, TimeBucket::Evening, SlotKind::Flex),
];

const PACKED_DAY: [ShapeEntry; 7] = [
    entry(0, TimeBucket::Morning, SlotKind::Anchor),
    entry(2, TimeBucket::Morning, SlotKind::Flex),
    entry(4, TimeBucket::MiddayMeal, SlotKind::Meal),
    entry(6, TimeBucket::Afternoon, SlotKind::Anchor),
    entry(8, TimeBucket::Afternoon, SlotKind::Flex),
    entry(10, TimeBucket::Evening, SlotKind::Flex),
    entry(12, TimeBucket::Evening, SlotKind::Flex),
];

/// A selected candidate bound to a day, an ordinal position, and a time
/// window. Ephemeral until the orchestrator persists it.
#[derive(Debug, Clone)]
pub struct PlacedSlot {
    pub activity: ActivityCandidate,
    pub score: f64,
    pub day: u32,
    pub position: u32,
    pub kind: SlotKind,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
}

#[derive(Default)]
pub struct SlotPlacer;

impl SlotPlacer {
    pub fn new() -> Self {
        Self
    }

    /// Slots per day after pace, template, and trip-length adjustments.
    /// Trips longer than a week drop one slot per day (floor 2) unless the
    /// traveler asked for a packed pace.
    pub fn effective_slots_per_day(seed: &PersonaSeed, total_days: u32) -> u32 {
        let base = seed.pace.base_slots_per_day();
        let modifier = seed.template.map(|t| t.pace_modifier()).unwrap_or(0);
        let mut slots = (base + modifier).clamp(MIN_SLOTS_PER_DAY, MAX_SLOTS_PER_DAY);

        if total_days > LONG_TRIP_DAYS && seed.pace != TripPace::Packed {
            slots = (slots - 1).max(MIN_SLOTS_PER_DAY);
        }

        slots as u32
    }

    /// Day shape for a slot count. Counts outside the named shapes truncate
    /// the packed shape.
    pub fn day_shape(slots_per_day: u32) -> Vec<ShapeEntry> {
        match slots_per_day {
            0 | 1 | 2 => UNHURRIED_DAY.to_vec(),
            3 => CLASSIC_DAY.to_vec(),
            4 => FULL_DAY.to_vec(),
            5 => EXTENDED_DAY.to_vec(),
            n => PACKED_DAY[..(n.min(7) as usize)].to_vec(),
        }
    }

    /// Per-bucket fallback cascade, tried in order until a pool yields a
    /// candidate
    pub fn fallback_order(bucket: TimeBucket) -> [TimeBucket; 4] {
        match bucket {
            TimeBucket::Morning => [
                TimeBucket::Morning,
                TimeBucket::Afternoon,
                TimeBucket::MiddayMeal,
                TimeBucket::Evening,
            ],
            TimeBucket::MiddayMeal => [
                TimeBucket::MiddayMeal,
                TimeBucket::Evening,
                TimeBucket::Afternoon,
                TimeBucket::Morning,
            ],
            TimeBucket::Afternoon => [
                TimeBucket::Afternoon,
                TimeBucket::Morning,
                TimeBucket::Evening,
                TimeBucket::MiddayMeal,
            ],
            TimeBucket::Evening => [
                TimeBucket::Evening,
                TimeBucket::Afternoon,
                TimeBucket::MiddayMeal,
                TimeBucket::Morning,
            ],
        }
    }

    /// Assign each selected candidate to a day, ordinal position, and time
    /// window. Positions with no available candidate in any pool are
    /// skipped; a day with gaps is expected, not an error.
    pub fn place(
        &self,
        selected: Vec<ScoredCandidate>,
        total_days: u32,
        seed: &PersonaSeed,
    ) -> Vec<PlacedSlot> {
        if selected.is_empty() || total_days == 0 {
            return Vec::new();
        }

        let slots_per_day = Self::effective_slots_per_day(seed, total_days);
        let shape = Self::day_shape(slots_per_day);
        let base_hour = seed.wake_preference.base_hour();

        // Pools keep the upstream score order within each bucket
        let mut pools: HashMap<TimeBucket, VecDeque<ScoredCandidate>> = HashMap::new();
        for candidate in selected {
            pools
                .entry(candidate.activity.category.preferred_bucket())
                .or_default()
                .push_back(candidate);
        }

        let mut placed = Vec::new();

        for day in 1..=total_days {
            let mut position = 0u32;

            for shape_entry in shape.iter().take(slots_per_day as usize) {
                let candidate = Self::fallback_order(shape_entry.bucket)
                    .iter()
                    .find_map(|bucket| pools.get_mut(bucket).and_then(|pool| pool.pop_front()));

                let Some(candidate) = candidate else {
                    continue;
                };

                position += 1;
                let start_hour = (base_hour as i64 + shape_entry.hour_offset).min(22) as u32;
                let start_time = NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap();
                let duration_minutes = candidate.activity.category.default_duration_minutes();
                let end_time = start_time + Duration::minutes(duration_minutes);

                placed.push(PlacedSlot {
                    score: candidate.score,
                    activity: candidate.activity,
                    day,
                    position,
                    kind: shape_entry.kind,
                    start_time,
                    end_time,
                    duration_minutes,
                });
            }
        }

        placed
    }
}
