use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Display metadata for one athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub first_name: String,
    pub last_name: String,
    pub step_goal: u64,
    pub step_record: u64,
    /// Personal best in km/h
    pub speed_record: f64,
}

impl AthleteProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

const DEMO_ATHLETES: [(&str, &str); 10] = [
    ("Chun Li", "Zhang"),
    ("Samus", "Aran"),
    ("Barret", "Wallace"),
    ("Cloud", "Strife"),
    ("Tifa", "Lockhart"),
    ("Mac", "Little"),
    ("Ryu", "Hoshi"),
    ("Terry", "Bogard"),
    ("Richter", "Belmont"),
    ("Faith", "Connors"),
];

/// Athlete id -> profile. Ordered as inserted.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    ids: Vec<String>,
    profiles: HashMap<String, AthleteProfile>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ten demo athletes, `athlete1`..`athlete10`, with randomized goals.
    pub fn demo<R: Rng>(rng: &mut R) -> Self {
        let mut roster = Self::new();
        for (i, (first_name, last_name)) in DEMO_ATHLETES.iter().enumerate() {
            roster.insert(
                format!("athlete{}", i + 1),
                AthleteProfile {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    step_goal: 10_000 + rng.gen_range(0..100) * 100,
                    step_record: 12_000 + rng.gen_range(0..1000),
                    speed_record: 20.0 + rng.gen_range(0..10) as f64,
                },
            );
        }
        roster
    }

    /// Replaces any existing profile for `id`.
    pub fn insert(&mut self, id: impl Into<String>, profile: AthleteProfile) {
        let id = id.into();
        if self.profiles.insert(id.clone(), profile).is_none() {
            self.ids.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&AthleteProfile> {
        self.profiles.get(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn display_name(&self, id: &str) -> String {
        self.get(id).map(AthleteProfile::full_name).unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_demo_roster_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let roster = Roster::demo(&mut rng);

        assert_eq!(roster.len(), 10);
        assert_eq!(roster.ids()[0], "athlete1");
        assert_eq!(roster.ids()[9], "athlete10");
        for id in roster.ids() {
            let profile = roster.get(id).unwrap();
            assert!((10_000..=19_900).contains(&profile.step_goal));
            assert_eq!(profile.step_goal % 100, 0);
            assert!((12_000..13_000).contains(&profile.step_record));
            assert!((20.0..30.0).contains(&profile.speed_record));
        }
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let roster = Roster::demo(&mut rng);

        assert_eq!(roster.display_name("athlete2"), "Samus Aran");
        assert_eq!(roster.display_name("athlete99"), "athlete99");
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let profile = AthleteProfile {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            step_goal: 1,
            step_record: 2,
            speed_record: 3.0,
        };
        let mut roster = Roster::new();
        roster.insert("x", profile.clone());
        roster.insert("y", profile.clone());
        roster.insert(
            "x",
            AthleteProfile {
                step_goal: 5,
                ..profile
            },
        );

        assert_eq!(roster.ids(), &["x".to_string(), "y".to_string()]);
        assert_eq!(roster.get("x").unwrap().step_goal, 5);
    }
}
