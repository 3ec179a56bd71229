use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use athlete_monitor::{
    app::App,
    config::{load_config_with, AppConfig, Overrides},
    feed::{start_feed_thread, SharedFeed},
    session::{build_roster, build_source, build_store, run_headless},
    ui,
};

/// Live fitness-tracker dashboard.
#[derive(Parser, Debug)]
#[command(name = "athlete_monitor", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay snapshots from a JSON lines file instead of generating them
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Seed for the demo roster and fake feed
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between snapshots in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Run without the TUI and print the final store as JSON
    #[arg(long)]
    headless: bool,

    /// Stop after this many cycles (headless only)
    #[arg(long, requires = "headless")]
    cycles: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            replay: self.replay.clone(),
            seed: self.seed,
            interval_ms: self.interval_ms,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config_with(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    init_logging(&config, cli.headless)?;
    info!("Starting athlete_monitor v{}", env!("CARGO_PKG_VERSION"));

    let roster = build_roster(&config);
    let source = build_source(&config, &roster)?;
    let store = build_store(&config);

    let shared = Arc::new(Mutex::new(SharedFeed::default()));
    let running = Arc::new(AtomicBool::new(true));
    let feed_thread = start_feed_thread(
        source,
        Duration::from_millis(config.feed.interval_ms),
        Arc::clone(&shared),
        Arc::clone(&running),
    )
    .context("failed to start feed thread")?;

    let app = App::new(store, roster, config.display.history_window);
    let tick_rate = Duration::from_millis(config.display.tick_rate_ms);

    let app = if cli.headless {
        let handler_flag = Arc::clone(&running);
        ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
        let mut stdout = io::stdout().lock();
        run_headless(app, &shared, &running, tick_rate, cli.cycles, &mut stdout)
            .context("failed to write store snapshot")?
    } else {
        ui::run(app, Arc::clone(&shared), tick_rate)?
    };
    info!(cycles = app.store.num_measurements(), "session ended");

    running.store(false, Ordering::SeqCst);
    if feed_thread.join().is_err() {
        warn!("feed thread panicked");
    }
    Ok(())
}

fn init_logging(config: &AppConfig, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid log filter")?;
    let registry = tracing_subscriber::registry().with(filter);

    if headless {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return Ok(());
    }

    // The TUI owns the terminal, so logs go to a file
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
