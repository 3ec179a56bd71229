//! Roster snapshot sources and the background thread that polls them.

use std::{
    collections::{HashMap, VecDeque},
    io::{self, BufRead},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread,
    time::Duration,
};

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::model::{AthleteData, Metrics};
use crate::util::round;

/// Feed errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open replay file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed snapshot on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that produces one full roster snapshot per call.
pub trait SnapshotSource: Send {
    /// `Ok(None)` once the source has nothing more to give.
    fn next_snapshot(&mut self) -> Result<Option<Vec<AthleteData>>, FeedError>;
}

// Per-athlete state of the random walk
#[derive(Debug, Clone, Copy)]
struct Walker {
    heart_rate: f64,
    speed: f64,
    steps: u64,
}

/// Generates plausible telemetry for a fixed set of athlete ids.
pub struct FakeFeed {
    ids: Vec<String>,
    walkers: HashMap<String, Walker>,
    absence_probability: f64,
    rng: StdRng,
}

impl FakeFeed {
    pub const HEART_RATE_RANGE: (f64, f64) = (50.0, 200.0);
    pub const SPEED_RANGE: (f64, f64) = (0.0, 35.0);

    pub fn new(ids: Vec<String>, absence_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ids,
            walkers: HashMap::new(),
            absence_probability: absence_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    fn step(&mut self, id: &str) -> Metrics {
        let rng = &mut self.rng;
        let walker = self.walkers.entry(id.to_string()).or_insert_with(|| Walker {
            heart_rate: rng.gen_range(65.0..110.0),
            speed: rng.gen_range(0.0..12.0),
            steps: rng.gen_range(0..4000),
        });

        let (hr_min, hr_max) = Self::HEART_RATE_RANGE;
        let (speed_min, speed_max) = Self::SPEED_RANGE;
        walker.heart_rate = (walker.heart_rate + rng.gen_range(-6.0..6.0))
            .clamp(hr_min, hr_max)
            .round();
        let speed = (walker.speed + rng.gen_range(-1.5..1.5)).clamp(speed_min, speed_max);
        walker.speed = round(speed, 2);
        // Roughly 1.5 steps per metre at a 2s cadence
        walker.steps += (walker.speed / 3.6 * 2.0 * 1.5) as u64 + rng.gen_range(0..3);

        Metrics {
            heart_rate: walker.heart_rate,
            steps: walker.steps,
            speed: walker.speed,
        }
    }
}

impl SnapshotSource for FakeFeed {
    fn next_snapshot(&mut self) -> Result<Option<Vec<AthleteData>>, FeedError> {
        let timestamp = Utc::now();
        let ids = self.ids.clone();
        let mut batch = Vec::with_capacity(ids.len());

        for id in ids {
            if self.rng.gen_bool(self.absence_probability) {
                debug!(athlete = %id, "fake feed skipping athlete this cycle");
                continue;
            }
            let metrics = self.step(&id);
            batch.push(AthleteData::new(id, timestamp, metrics));
        }
        Ok(Some(batch))
    }
}

/// Replays snapshots from JSON lines, one array of samples per line.
pub struct JsonLinesFeed<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> JsonLinesFeed<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead + Send> SnapshotSource for JsonLinesFeed<R> {
    fn next_snapshot(&mut self) -> Result<Option<Vec<AthleteData>>, FeedError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            // Bytes, not str: a line with bad UTF-8 is one bad snapshot, not a dead reader
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return serde_json::from_slice(&buf)
                .map(Some)
                .map_err(|source| FeedError::Decode { line: self.line, source });
        }
    }
}

// From feed thread to UI thread
#[derive(Debug, Default)]
pub struct SharedFeed {
    pub pending: VecDeque<Vec<AthleteData>>,
    pub finished: bool,
}

pub fn lock_shared(shared: &Mutex<SharedFeed>) -> MutexGuard<'_, SharedFeed> {
    // The feed thread only pushes whole snapshots, so a poisoned queue is still consistent
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs `source` on its own thread, queuing a snapshot every `interval`
/// until the source runs dry or `running` is cleared.
pub fn start_feed_thread(
    mut source: Box<dyn SnapshotSource>,
    interval: Duration,
    shared: Arc<Mutex<SharedFeed>>,
    running: Arc<AtomicBool>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("roster-feed".to_string()).spawn(move || {
        while running.load(Ordering::SeqCst) {
            match source.next_snapshot() {
                Ok(Some(batch)) => {
                    debug!(athletes = batch.len(), "snapshot queued");
                    lock_shared(&shared).pending.push_back(batch);
                }
                Ok(None) => {
                    info!("feed exhausted");
                    break;
                }
                Err(FeedError::Decode { line, source }) => {
                    warn!(line, error = %source, "skipping malformed snapshot");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "feed failed");
                    break;
                }
            }
            thread::sleep(interval);
        }
        lock_shared(&shared).finished = true;
    })
}
