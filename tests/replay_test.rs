//! Replayed snapshots flowing through the app into the store.

use std::io::Cursor;
use std::sync::{atomic::AtomicBool, Arc, Mutex};
use std::time::Duration;

use athlete_monitor::app::App;
use athlete_monitor::feed::{start_feed_thread, JsonLinesFeed, SharedFeed};
use athlete_monitor::roster::Roster;
use athlete_monitor::store::AthleteStore;

const SESSION: &str = concat!(
    r#"[{"athleteId":"athlete1","timestamp":"2024-06-01T09:00:00Z","#,
    r#""metrics":{"heartRate":100,"steps":10,"speed":5}}]"#,
    "\n",
    r#"[{"athleteId":"athlete1","timestamp":"2024-06-01T09:00:02Z","#,
    r#""metrics":{"heartRate":110,"steps":20,"speed":6}},"#,
    r#"{"athleteId":"athlete2","timestamp":"2024-06-01T09:00:02Z","#,
    r#""metrics":{"heartRate":90,"steps":5,"speed":3}}]"#,
    "\n",
    "this line is garbage\n",
    r#"[{"athleteId":"athlete2","timestamp":"2024-06-01T09:00:04Z","#,
    r#""metrics":{"heartRate":94,"steps":9,"speed":3.4}}]"#,
    "\n",
);

#[test]
fn test_replay_through_feed_thread() {
    let shared = Arc::new(Mutex::new(SharedFeed::default()));
    let handle = start_feed_thread(
        Box::new(JsonLinesFeed::new(Cursor::new(SESSION))),
        Duration::from_millis(1),
        Arc::clone(&shared),
        Arc::new(AtomicBool::new(true)),
    )
    .unwrap();
    handle.join().unwrap();

    let mut app = App::new(AthleteStore::new(), Roster::new(), 60);
    let reports = app.on_tick(&shared);

    // The garbage line is skipped
    assert_eq!(reports.len(), 3);
    assert!(app.feed_finished);

    let store = &app.store;
    assert_eq!(store.num_measurements(), 3);
    assert_eq!(
        store.dataset("athlete1").unwrap().heart_rate,
        vec![Some(100.0), Some(110.0), None]
    );
    assert_eq!(
        store.dataset("athlete2").unwrap().heart_rate,
        vec![None, Some(90.0), Some(94.0)]
    );
    assert_eq!(store.stats("athlete1").unwrap().heart_rate.avg, 105.0);
    assert_eq!(store.stats("athlete2").unwrap().speed.avg, 3.2);

    let record = store.speed_record().unwrap();
    assert_eq!(record.athlete_id, "athlete1");
    assert_eq!(record.record_value, 6.0);
}

#[test]
fn test_demo_session_file_replays_cleanly() {
    use athlete_monitor::feed::SnapshotSource;
    use std::fs::File;
    use std::io::BufReader;

    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/session.jsonl");
    let mut feed = JsonLinesFeed::new(BufReader::new(File::open(path).unwrap()));
    let mut store = AthleteStore::new();

    while let Some(batch) = feed.next_snapshot().unwrap() {
        store.replace_list(batch);
    }

    assert_eq!(store.num_measurements(), 12);
    for (_, dataset) in store.datasets().iter() {
        assert_eq!(dataset.len(), 12);
    }
}
