// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Seeded sample records for offline runs.

use serde_json::{Value, json};
use time::{Date, Month};

const ACTIVITY_TYPES: [&str; 10] = [
    "Running",
    "Cycling",
    "Swimming",
    "Walking",
    "Hiking",
    "Rowing",
    "Strength Training",
    "Yoga",
    "Jump Rope",
    "Basketball",
];

const DISTANCE_ACTIVITIES: [&str; 6] = [
    "Running", "Cycling", "Swimming", "Walking", "Hiking", "Rowing",
];

const HEROES: [&str; 12] = [
    "tony.stark",
    "steve.rogers",
    "natasha.romanoff",
    "bruce.banner",
    "clark.kent",
    "diana.prince",
    "bruce.wayne",
    "barry.allen",
    "peter.parker",
    "wanda.maximoff",
    "arthur.curry",
    "hal.jordan",
];

const TEAMS: [&str; 2] = ["marvel", "dc"];

const LOCATIONS: [&str; 8] = [
    "Track",
    "Park",
    "Pool",
    "Gym",
    "Trail",
    "Lake",
    "Stadium",
    "Home",
];

const INTENSITIES: [&str; 3] = ["low", "moderate", "high"];

const REFERENCE_YEAR: i32 = 2026;
pub const DEMO_SEED: u64 = 8000;
pub const DEMO_COUNT: usize = 24;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Deterministic activity records shaped like the fitness tracker API.
#[derive(Debug, Clone)]
pub struct ActivityFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ActivityFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn activity(&mut self, id: i64) -> Value {
        let activity_type = self.pick(&ACTIVITY_TYPES);
        let hero = self.pick(&HEROES);
        let duration = self.int_range(15, 120);
        let distance = if DISTANCE_ACTIVITIES.contains(&activity_type) {
            json!(self.int_range(10, 250) as f64 / 10.0)
        } else {
            Value::Null
        };

        json!({
            "id": id,
            "user": {
                "email": format!("{hero}@octofit.example"),
                "team": self.pick(&TEAMS),
            },
            "activity_type": activity_type,
            "duration": duration,
            "distance_km": distance,
            "calories": duration * self.int_range(5, 12),
            "date": self.date_in_year(REFERENCE_YEAR),
            "details": {
                "location": self.pick(&LOCATIONS),
                "intensity": self.pick(&INTENSITIES),
                "outdoor": self.rng.bool(),
            },
        })
    }

    pub fn activities(&mut self, count: usize) -> Vec<Value> {
        (1..=count as i64).map(|id| self.activity(id)).collect()
    }

    /// `YYYY-MM-DD` within `year`.
    pub fn date_in_year(&mut self, year: i32) -> String {
        let month = Month::January.nth_next(self.rng.int_n(12) as u8);
        let day = self.int_range(1, 28) as u8;
        match Date::from_calendar_date(year, month, day) {
            Ok(date) => format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
            Err(_) => format!("{year:04}-01-01"),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn demo_activities() -> Vec<Value> {
    ActivityFaker::new(DEMO_SEED).activities(DEMO_COUNT)
}

#[cfg(test)]
mod tests {
    use super::{ActivityFaker, DEMO_COUNT, DISTANCE_ACTIVITIES, demo_activities};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_activities() {
        let first = ActivityFaker::new(11).activities(5);
        let second = ActivityFaker::new(11).activities(5);
        assert_eq!(first, second);
    }

    #[test]
    fn activity_has_stable_key_order() {
        let activity = ActivityFaker::new(3).activity(1);
        let keys = activity
            .as_object()
            .expect("activity should be an object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "id",
                "user",
                "activity_type",
                "duration",
                "distance_km",
                "calories",
                "date",
                "details",
            ]
        );
    }

    #[test]
    fn ids_are_sequential() {
        let activities = ActivityFaker::new(4).activities(3);
        let ids = activities
            .iter()
            .map(|activity| activity["id"].as_i64())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn distance_only_for_distance_sports() {
        let mut faker = ActivityFaker::new(5);
        for activity in faker.activities(50) {
            let kind = activity["activity_type"].as_str().expect("type is text");
            let has_distance = !activity["distance_km"].is_null();
            assert_eq!(
                has_distance,
                DISTANCE_ACTIVITIES.contains(&kind),
                "{kind}"
            );
        }
    }

    #[test]
    fn dates_are_iso_formatted() {
        let mut faker = ActivityFaker::new(6);
        for _ in 0..30 {
            let date = faker.date_in_year(2026);
            assert_eq!(date.len(), 10, "{date}");
            assert!(date.starts_with("2026-"), "{date}");
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut kinds = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let activity = ActivityFaker::new(seed).activity(1);
            kinds.insert(activity["activity_type"].to_string());
        }
        assert!(kinds.len() >= 5, "got {}", kinds.len());
    }

    #[test]
    fn demo_set_size() {
        assert_eq!(demo_activities().len(), DEMO_COUNT);
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(ActivityFaker::new(0).seed(), 1);
    }
}
