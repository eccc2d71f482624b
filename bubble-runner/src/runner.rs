//! Single compute run: acquire → compose → persist.
//!
//! Nothing is written unless acquisition and composing both succeed.
//!
//! The history is written before the snapshot. A corrupt history file
//! aborts the run with both artifacts untouched, and a failed snapshot
//! write leaves the previous snapshot in place next to a history that
//! already holds today's row. The published snapshot therefore always has
//! a matching history row.

use crate::history::{HistoryRow, HistoryStore, Upsert};
use crate::persist::PersistError;
use crate::snapshot::{SnapshotRecord, SnapshotStore};
use bubble_core::data::{acquire, AcquisitionError, SeriesSource};
use bubble_core::{compose, ComposeError, CompositeIndex, ScoringConfig};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a compute run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid scoring config: {0}")]
    Scoring(#[from] bubble_core::scoring::ConfigError),

    #[error("acquisition failed with placeholders disabled: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("computation failed: {0}")]
    Compose(#[from] ComposeError),

    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
}

/// Inputs for one run besides the sources themselves.
#[derive(Debug, Clone)]
pub struct ComputeOptions {
    pub snapshot_path: PathBuf,
    pub history_path: PathBuf,
    pub scoring: ScoringConfig,
    pub allow_placeholders: bool,
    /// Date the run is recorded under.
    pub as_of: NaiveDate,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub index: CompositeIndex,
    pub snapshot: SnapshotRecord,
    pub history_upsert: Upsert,
    pub history_rows: usize,
}

/// Acquire all series, compose the index and persist both artifacts.
pub fn run_compute(
    sources: &[Box<dyn SeriesSource>],
    opts: &ComputeOptions,
) -> Result<RunOutcome, RunError> {
    opts.scoring.validate()?;
    tracing::info!(
        as_of = %opts.as_of,
        sources = sources.len(),
        allow_placeholders = opts.allow_placeholders,
        "starting compute run"
    );

    let observations = acquire(sources, opts.allow_placeholders)?;
    let index = compose(&observations, &opts.scoring, opts.as_of)?;
    let snapshot = SnapshotRecord::from_index(&index, opts.scoring.fingerprint()?);

    let (history_upsert, history_rows) =
        HistoryStore::new(&opts.history_path).upsert(HistoryRow::from_index(&index))?;
    tracing::info!(
        path = %opts.history_path.display(),
        rows = history_rows,
        upsert = ?history_upsert,
        "wrote history"
    );

    SnapshotStore::new(&opts.snapshot_path).write(&snapshot)?;
    tracing::info!(path = %opts.snapshot_path.display(), "wrote snapshot");

    tracing::info!(
        score = index.score,
        band = %index.band,
        placeholders = index.placeholder_count(),
        "compute run complete"
    );

    Ok(RunOutcome {
        index,
        snapshot,
        history_upsert,
        history_rows,
    })
}
