use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest speed seen across all athletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedRecord {
    #[serde(alias = "athlete_id")]
    pub athlete_id: String,
    #[serde(alias = "record_value")]
    pub record_value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SpeedRecordTracker {
    current: Option<SpeedRecord>,
}

impl SpeedRecordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a record carried over from an earlier session.
    pub fn with_initial(record: SpeedRecord) -> Self {
        Self { current: Some(record) }
    }

    pub fn current(&self) -> Option<&SpeedRecord> {
        self.current.as_ref()
    }

    /// 0 until anything has been recorded.
    pub fn value(&self) -> f64 {
        self.current.as_ref().map_or(0.0, |record| record.record_value)
    }

    /// Replaces the record if `speed` strictly beats it. Returns the new
    /// record when it changed.
    pub fn maybe_update(
        &mut self,
        athlete_id: &str,
        speed: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<&SpeedRecord> {
        if speed <= self.value() {
            return None;
        }

        self.current = Some(SpeedRecord {
            athlete_id: athlete_id.to_string(),
            record_value: speed,
            timestamp,
        });
        self.current.as_ref()
    }
}
