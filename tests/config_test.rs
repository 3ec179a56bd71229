use std::path::PathBuf;

use athlete_monitor::config::{
    load_config, save_config, AppConfig, AthleteEntry, ConfigError, FeedSource,
};
use athlete_monitor::roster::AthleteProfile;
use tempfile::tempdir;

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.feed.source = FeedSource::Replay {
        path: PathBuf::from("/data/session.jsonl"),
    };
    config.feed.seed = Some(5);
    config.display.history_window = 120;
    config.athletes.push(AthleteEntry {
        id: "rider-7".to_string(),
        profile: AthleteProfile {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            step_goal: 11_000,
            step_record: 14_500,
            speed_record: 26.0,
        },
    });

    save_config(&config, &path).unwrap();
    let loaded = load_config(Some(path.as_path())).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    assert!(matches!(load_config(Some(path.as_path())), Err(ConfigError::IoError(_))));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[feed]\nabsence_probability = -0.5\n").unwrap();

    assert!(matches!(load_config(Some(path.as_path())), Err(ConfigError::Invalid(_))));
}
