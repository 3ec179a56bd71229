//! Wiring from a loaded config to a running session, and the headless run.

use std::{
    fs::File,
    io::{self, BufReader, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    thread,
    time::Duration,
};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::app::App;
use crate::config::{AppConfig, FeedSource};
use crate::feed::{FakeFeed, FeedError, JsonLinesFeed, SharedFeed, SnapshotSource};
use crate::roster::Roster;
use crate::store::AthleteStore;

/// Athletes from the config, or the demo roster when none are listed.
pub fn build_roster(config: &AppConfig) -> Roster {
    if config.athletes.is_empty() {
        let mut rng = match config.feed.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        return Roster::demo(&mut rng);
    }

    let mut roster = Roster::new();
    for entry in &config.athletes {
        roster.insert(entry.id.clone(), entry.profile.clone());
    }
    roster
}

pub fn build_source(
    config: &AppConfig,
    roster: &Roster,
) -> Result<Box<dyn SnapshotSource>, FeedError> {
    match &config.feed.source {
        FeedSource::Fake => {
            info!(athletes = roster.len(), "using generated demo data");
            Ok(Box::new(FakeFeed::new(
                roster.ids().to_vec(),
                config.feed.absence_probability,
                config.feed.seed,
            )))
        }
        FeedSource::Replay { path } => {
            let file = File::open(path).map_err(|source| FeedError::Open {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "replaying snapshots");
            Ok(Box::new(JsonLinesFeed::new(BufReader::new(file))))
        }
    }
}

/// Empty store, or one that starts from the configured record.
pub fn build_store(config: &AppConfig) -> AthleteStore {
    match config.speed_record.clone() {
        Some(record) => AthleteStore::with_speed_record(record),
        None => AthleteStore::new(),
    }
}

/// Drains the feed every `tick_rate` without a terminal UI.
///
/// Stops once `cycles` snapshots have been applied, when the feed has
/// nothing left, or when `running` is cleared. The store is then written
/// to `out` as pretty JSON.
pub fn run_headless<W: Write>(
    mut app: App,
    shared: &Mutex<SharedFeed>,
    running: &AtomicBool,
    tick_rate: Duration,
    cycles: Option<u64>,
    out: &mut W,
) -> io::Result<App> {
    while running.load(Ordering::SeqCst) {
        let remaining = match cycles {
            Some(limit) => limit.saturating_sub(app.store.num_measurements()),
            None => u64::MAX,
        };
        if remaining == 0 {
            debug!(cycles = app.store.num_measurements(), "cycle limit reached");
            break;
        }

        thread::sleep(tick_rate);
        app.drain_feed(shared, usize::try_from(remaining).unwrap_or(usize::MAX));

        if app.feed_finished {
            break;
        }
    }

    write_snapshot(&app, out)?;
    Ok(app)
}

/// The store as pretty JSON plus a trailing newline.
pub fn write_snapshot<W: Write>(app: &App, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &app.store.snapshot())?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AthleteEntry;
    use crate::roster::AthleteProfile;

    #[test]
    fn test_configured_athletes_replace_demo_roster() {
        let mut config = AppConfig::default();
        config.athletes.push(AthleteEntry {
            id: "rower-1".to_string(),
            profile: AthleteProfile {
                first_name: "Ada".to_string(),
                last_name: "Byron".to_string(),
                step_goal: 9_000,
                step_record: 12_000,
                speed_record: 18.0,
            },
        });

        let roster = build_roster(&config);
        assert_eq!(roster.ids(), ["rower-1".to_string()]);
        assert_eq!(roster.display_name("rower-1"), "Ada Byron");
    }

    #[test]
    fn test_seeded_demo_roster_is_stable() {
        let mut config = AppConfig::default();
        config.feed.seed = Some(21);

        let a = build_roster(&config);
        let b = build_roster(&config);
        assert_eq!(a.len(), 10);
        assert_eq!(a.get("athlete3"), b.get("athlete3"));
    }

    #[test]
    fn test_missing_replay_file_names_the_path() {
        let mut config = AppConfig::default();
        config.feed.source = FeedSource::Replay {
            path: "/no/such/dir/session.jsonl".into(),
        };

        match build_source(&config, &Roster::new()) {
            Err(err @ FeedError::Open { .. }) => {
                assert!(err.to_string().contains("/no/such/dir/session.jsonl"))
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opened a file that does not exist"),
        }
    }

    #[test]
    fn test_stopped_run_still_writes_snapshot() {
        let app = App::new(AthleteStore::new(), Roster::new(), 60);
        let shared = Mutex::new(SharedFeed::default());
        let mut out = Vec::new();

        let app = run_headless(
            app,
            &shared,
            &AtomicBool::new(false),
            Duration::from_millis(1),
            None,
            &mut out,
        )
        .unwrap();

        assert_eq!(app.store.num_measurements(), 0);
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["numMeasurements"], 0);
        assert!(json["speedRecord"].is_null());
    }
}
