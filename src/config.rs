//! Application configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ABSENCE_PROBABILITY, FEED_INTERVAL_MS, HISTORY_WINDOW, LOG_FILE_NAME, TICK_RATE_MS,
};
use crate::record::SpeedRecord;
use crate::roster::AthleteProfile;

/// Where roster snapshots come from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedSource {
    /// Generated demo data
    #[default]
    Fake,
    /// JSON lines file, one snapshot per line
    Replay { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub source: FeedSource,
    /// Delay between snapshots
    pub interval_ms: u64,
    /// Chance that a fake athlete skips a cycle
    pub absence_probability: f64,
    /// Fixed seed for the fake generator
    pub seed: Option<u64>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            source: FeedSource::Fake,
            interval_ms: FEED_INTERVAL_MS,
            absence_probability: ABSENCE_PROBABILITY,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub tick_rate_ms: u64,
    /// Points shown in the detail charts
    pub history_window: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            tick_rate_ms: TICK_RATE_MS,
            history_window: HISTORY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Log file used while the TUI owns the terminal
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteEntry {
    pub id: String,
    #[serde(flatten)]
    pub profile: AthleteProfile,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
    /// Record to beat, e.g. carried over from a previous session
    pub speed_record: Option<SpeedRecord>,
    /// Roster; the demo athletes are used when empty
    pub athletes: Vec<AthleteEntry>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.interval_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.feed.absence_probability) {
            return Err(ConfigError::Invalid(
                "feed.absence_probability must be between 0 and 1".to_string(),
            ));
        }
        if self.display.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid(
                "display.tick_rate_ms must be greater than 0".to_string(),
            ));
        }
        if self.display.history_window == 0 {
            return Err(ConfigError::Invalid(
                "display.history_window must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Lets command-line values win over the file.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.replay {
            self.feed.source = FeedSource::Replay { path: path.clone() };
        }
        if overrides.seed.is_some() {
            self.feed.seed = overrides.seed;
        }
        if let Some(interval_ms) = overrides.interval_ms {
            self.feed.interval_ms = interval_ms;
        }
    }

    /// Log file path, falling back to the data directory.
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| get_data_dir().join(LOG_FILE_NAME))
    }
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub replay: Option<PathBuf>,
    pub seed: Option<u64>,
    pub interval_ms: Option<u64>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "athlete-monitor", "AthleteMonitor")
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Loads the configuration. An explicit `path` must exist; a missing file
/// at the default location just means defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, &Overrides::default())
}

/// [`load_config`], with `overrides` applied before validation.
pub fn load_config_with(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => {
            let default_path = get_config_path();
            if default_path.exists() {
                read_config(&default_path)?
            } else {
                AppConfig::default()
            }
        }
    };

    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save configuration to `path`, creating parent directories.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
