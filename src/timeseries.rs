//! Gap-aware chart buffers.
//!
//! Every dataset grows by exactly one point per cycle. An athlete missing
//! from a cycle gets `None`, which the chart draws as a break in the line.
//! Athletes that show up late are back-filled with leading `None`s. This is
//! a choice made here, not something the incoming data implies: it keeps
//! all datasets the same length (the number of cycles seen) so charts for
//! different athletes line up on the same x axis.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::model::AthleteData;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteDataset {
    pub heart_rate: Vec<Option<f64>>,
    pub speed: Vec<Option<f64>>,
}

impl AthleteDataset {
    fn seeded(leading_gaps: usize, heart_rate: f64, speed: f64) -> Self {
        let mut dataset = Self {
            heart_rate: vec![None; leading_gaps],
            speed: vec![None; leading_gaps],
        };
        dataset.push(heart_rate, speed);
        dataset
    }

    fn push(&mut self, heart_rate: f64, speed: f64) {
        self.heart_rate.push(Some(heart_rate));
        self.speed.push(Some(speed));
    }

    fn push_gap(&mut self) {
        self.heart_rate.push(None);
        self.speed.push(None);
    }

    // Same athlete twice in one batch: keep the later value
    fn overwrite_last(&mut self, heart_rate: f64, speed: f64) {
        if let (Some(hr), Some(sp)) = (self.heart_rate.last_mut(), self.speed.last_mut()) {
            *hr = Some(heart_rate);
            *sp = Some(speed);
        }
    }

    pub fn len(&self) -> usize {
        self.heart_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_empty()
    }

    /// The last `window` heart rate points.
    pub fn recent_heart_rate(&self, window: usize) -> &[Option<f64>] {
        tail(&self.heart_rate, window)
    }

    /// The last `window` speed points.
    pub fn recent_speed(&self, window: usize) -> &[Option<f64>] {
        tail(&self.speed, window)
    }
}

fn tail(values: &[Option<f64>], window: usize) -> &[Option<f64>] {
    &values[values.len().saturating_sub(window)..]
}

/// What a batch did to the buffer, for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAppend {
    pub created: Vec<String>,
    pub gaps: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DatasetBuffer {
    datasets: HashMap<String, AthleteDataset>,
    cycles: usize,
}

impl DatasetBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one cycle's roster snapshot.
    pub fn append_batch(&mut self, batch: &[AthleteData]) -> BatchAppend {
        let mut report = BatchAppend::default();
        let mut present: HashSet<&str> = HashSet::with_capacity(batch.len());

        for sample in batch {
            let heart_rate = sample.metrics.heart_rate;
            let speed = sample.metrics.speed;

            if !present.insert(sample.athlete_id.as_str()) {
                warn!(
                    athlete = %sample.athlete_id,
                    "athlete appears twice in one batch, keeping the later sample"
                );
                if let Some(dataset) = self.datasets.get_mut(&sample.athlete_id) {
                    dataset.overwrite_last(heart_rate, speed);
                }
                continue;
            }

            match self.datasets.get_mut(&sample.athlete_id) {
                Some(dataset) => dataset.push(heart_rate, speed),
                None => {
                    self.datasets.insert(
                        sample.athlete_id.clone(),
                        AthleteDataset::seeded(self.cycles, heart_rate, speed),
                    );
                    report.created.push(sample.athlete_id.clone());
                }
            }
        }

        for (athlete_id, dataset) in self.datasets.iter_mut() {
            if !present.contains(athlete_id.as_str()) {
                dataset.push_gap();
                report.gaps.push(athlete_id.clone());
            }
        }
        report.gaps.sort();

        self.cycles += 1;
        report
    }

    pub fn get(&self, athlete_id: &str) -> Option<&AthleteDataset> {
        self.datasets.get(athlete_id)
    }

    /// Number of batches appended so far.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AthleteDataset)> {
        self.datasets.iter()
    }
}
