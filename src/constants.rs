pub const TICK_RATE_MS: u64 = 250;
pub const FEED_INTERVAL_MS: u64 = 2000;

// Chart window in cycles; the buffers themselves are never trimmed
pub const HISTORY_WINDOW: usize = 60;

pub const HEART_RATE_DECIMALS: u32 = 0;
pub const SPEED_DECIMALS: u32 = 2;

pub const ABSENCE_PROBABILITY: f64 = 0.1;

pub const LOG_FILE_NAME: &str = "athlete_monitor.log";
