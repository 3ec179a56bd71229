//! Session-scoped athlete store.
//!
//! Owns everything derived from the roster snapshots: running stats, chart
//! buffers, and the global speed record. Built once per session and fed one
//! snapshot per cycle through [`AthleteStore::replace_list`]. Readers call
//! the accessors on every draw; nothing is cached on the read side.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::model::AthleteData;
use crate::record::{SpeedRecord, SpeedRecordTracker};
use crate::stats::{self, AthleteStats, StatsMap};
use crate::timeseries::{AthleteDataset, DatasetBuffer};

/// Outcome of a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// Samples in the snapshot
    pub athletes: usize,
    /// Athletes seen for the first time
    pub new_athletes: Vec<String>,
    /// Known athletes missing from the snapshot
    pub absent: Vec<String>,
    /// Set when the snapshot produced a new global speed record
    pub new_record: Option<SpeedRecord>,
}

#[derive(Debug, Default)]
pub struct AthleteStore {
    athlete_list: Vec<AthleteData>,
    stats: StatsMap,
    datasets: DatasetBuffer,
    speed_record: SpeedRecordTracker,
    num_measurements: u64,
}

impl AthleteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed_record(record: SpeedRecord) -> Self {
        Self {
            speed_record: SpeedRecordTracker::with_initial(record),
            ..Self::default()
        }
    }

    /// Ingests one full roster snapshot.
    pub fn replace_list(&mut self, new_list: Vec<AthleteData>) -> CycleReport {
        let mut new_record = None;

        for sample in &new_list {
            let athlete_stats = stats::update(&mut self.stats, sample);
            debug!(
                athlete = %sample.athlete_id,
                heart_rate = sample.metrics.heart_rate,
                speed = sample.metrics.speed,
                measurements = athlete_stats.num_measurements,
                "sample applied"
            );

            // Checked on an athlete's first sample too, not only when their max rises,
            // so a newcomer faster than the record takes it in the cycle they appear
            let athlete_max = athlete_stats.speed.max;
            if let Some(record) = self
                .speed_record
                .maybe_update(&sample.athlete_id, athlete_max, sample.timestamp)
            {
                new_record = Some(record.clone());
            }
        }

        let appended = self.datasets.append_batch(&new_list);

        self.num_measurements += 1;
        let report = CycleReport {
            cycle: self.num_measurements,
            athletes: new_list.len(),
            new_athletes: appended.created,
            absent: appended.gaps,
            new_record,
        };
        self.athlete_list = new_list;
        report
    }

    /// The snapshot from the most recent cycle.
    pub fn athlete_list(&self) -> &[AthleteData] {
        &self.athlete_list
    }

    /// Latest sample for an athlete, if they were in the last snapshot.
    pub fn latest(&self, athlete_id: &str) -> Option<&AthleteData> {
        self.athlete_list.iter().rev().find(|sample| sample.athlete_id == athlete_id)
    }

    pub fn stats(&self, athlete_id: &str) -> Option<&AthleteStats> {
        self.stats.get(athlete_id)
    }

    pub fn all_stats(&self) -> &StatsMap {
        &self.stats
    }

    pub fn dataset(&self, athlete_id: &str) -> Option<&AthleteDataset> {
        self.datasets.get(athlete_id)
    }

    pub fn datasets(&self) -> &DatasetBuffer {
        &self.datasets
    }

    pub fn speed_record(&self) -> Option<&SpeedRecord> {
        self.speed_record.current()
    }

    /// Number of cycles processed.
    pub fn num_measurements(&self) -> u64 {
        self.num_measurements
    }

    /// Athlete id -> speed from the last snapshot.
    pub fn new_speed_values(&self) -> HashMap<String, f64> {
        self.athlete_list
            .iter()
            .map(|sample| (sample.athlete_id.clone(), sample.metrics.speed))
            .collect()
    }

    /// Every athlete ever seen, sorted by id.
    pub fn known_athletes(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stats.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            num_measurements: self.num_measurements,
            athlete_list: &self.athlete_list,
            athlete_analysis: &self.stats,
            athlete_datasets: self.datasets.iter().collect(),
            speed_record: self.speed_record.current(),
        }
    }
}

/// Borrowed, serializable view of the whole store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot<'a> {
    pub num_measurements: u64,
    pub athlete_list: &'a [AthleteData],
    pub athlete_analysis: &'a StatsMap,
    pub athlete_datasets: HashMap<&'a String, &'a AthleteDataset>,
    pub speed_record: Option<&'a SpeedRecord>,
}
