//! Live terminal dashboard for athlete fitness-tracker telemetry.
//!
//! Roster snapshots come in from a [`feed::SnapshotSource`] and are folded
//! into an [`store::AthleteStore`], which keeps running stats, gap-aware
//! chart buffers and the global speed record. The [`ui`] module renders it.

pub mod app;
pub mod config;
pub mod constants;
pub mod feed;
pub mod model;
pub mod record;
pub mod roster;
pub mod session;
pub mod stats;
pub mod store;
pub mod timeseries;
pub mod ui;
pub mod util;
