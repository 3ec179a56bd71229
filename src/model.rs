use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live metrics reported by one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Beats per minute
    pub heart_rate: f64,
    /// Steps since the tracker was reset
    pub steps: u64,
    /// km/h
    pub speed: f64,
}

/// One sample for one athlete at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteData {
    pub athlete_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: Metrics,
}

impl AthleteData {
    pub fn new(athlete_id: impl Into<String>, timestamp: DateTime<Utc>, metrics: Metrics) -> Self {
        Self {
            athlete_id: athlete_id.into(),
            timestamp,
            metrics,
        }
    }
}
