//! Bubble Runner — configuration, run orchestration, and artifact persistence.
//!
//! This crate builds on `bubble-core` to provide:
//! - Environment configuration read once into an explicit `AppConfig`
//! - The compute run (acquire, compose, persist)
//! - The latest-snapshot JSON store (atomic replace)
//! - The daily CSV history with upsert-by-date

pub mod config;
pub mod history;
pub mod persist;
pub mod runner;
pub mod snapshot;

pub use config::{AppConfig, ConfigError};
pub use history::{HistoryRow, HistoryStore, Upsert, DEFAULT_HISTORY_PATH};
pub use persist::{write_atomic, PersistError};
pub use runner::{run_compute, ComputeOptions, RunError, RunOutcome};
pub use snapshot::{SnapshotRecord, SnapshotSeries, SnapshotStore, DEFAULT_SNAPSHOT_PATH};
