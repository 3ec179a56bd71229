//! Running per-athlete statistics.
//!
//! Averages are re-rounded on every update, so after many cycles they can
//! drift from the exact arithmetic mean. Good enough for a display, not
//! for analysis.

use std::collections::HashMap;

use serde::Serialize;

use crate::constants::{HEART_RATE_DECIMALS, SPEED_DECIMALS};
use crate::model::AthleteData;
use crate::util::round;

pub type StatsMap = HashMap<String, AthleteStats>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeartRateStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// No minimum: resting speed is ~0 and not worth showing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedStats {
    pub avg: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteStats {
    pub num_measurements: u32,
    pub heart_rate: HeartRateStats,
    pub speed: SpeedStats,
}

impl AthleteStats {
    /// Stats for an athlete observed exactly once.
    pub fn first(heart_rate: f64, speed: f64) -> Self {
        Self {
            num_measurements: 1,
            heart_rate: HeartRateStats {
                min: heart_rate,
                avg: heart_rate,
                max: heart_rate,
            },
            speed: SpeedStats {
                avg: speed,
                max: speed,
            },
        }
    }

    /// Folds one more measurement in.
    pub fn observe(&mut self, heart_rate: f64, speed: f64) {
        self.num_measurements += 1;

        // min <= max always holds, so a sample can't be both
        if heart_rate < self.heart_rate.min {
            self.heart_rate.min = heart_rate;
        }
        if heart_rate > self.heart_rate.max {
            self.heart_rate.max = heart_rate;
        }
        if speed > self.speed.max {
            self.speed.max = speed;
        }

        self.heart_rate.avg = rounded_average(
            self.heart_rate.avg,
            self.num_measurements,
            heart_rate,
            HEART_RATE_DECIMALS,
        );
        self.speed.avg =
            rounded_average(self.speed.avg, self.num_measurements, speed, SPEED_DECIMALS);
    }
}

/// Incremental mean. `num_measurements` already counts `new_value`.
pub fn rounded_average(
    prev_average: f64,
    num_measurements: u32,
    new_value: f64,
    decimal_places: u32,
) -> f64 {
    let n = num_measurements as f64;
    round((prev_average * (n - 1.0) + new_value) / n, decimal_places)
}

/// Applies one sample to the map and returns the athlete's updated stats.
pub fn update<'a>(stats: &'a mut StatsMap, sample: &AthleteData) -> &'a AthleteStats {
    let heart_rate = sample.metrics.heart_rate;
    let speed = sample.metrics.speed;

    stats
        .entry(sample.athlete_id.clone())
        .and_modify(|entry| entry.observe(heart_rate, speed))
        .or_insert_with(|| AthleteStats::first(heart_rate, speed))
}
