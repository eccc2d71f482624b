//! Latest-snapshot artifact: a single JSON record, replaced every run.

use crate::persist::{write_atomic, PersistError};
use bubble_core::{Band, CompositeIndex, SeriesId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = "bubble_today.json";

/// Per-series entry of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSeries {
    pub id: SeriesId,
    /// `None` when the raw value is not finite.
    pub raw: Option<f64>,
    pub normalized: f64,
    pub is_placeholder: bool,
    pub weight: f64,
}

/// The persisted form of a `CompositeIndex`.
///
/// Contains no wall-clock timestamp: identical inputs on the same date
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub as_of: NaiveDate,
    pub composite_score: f64,
    pub band: Band,
    pub series: Vec<SnapshotSeries>,
    pub scoring_fingerprint: String,
}

impl SnapshotRecord {
    pub fn from_index(index: &CompositeIndex, scoring_fingerprint: impl Into<String>) -> Self {
        Self {
            as_of: index.as_of,
            composite_score: index.score,
            band: index.band,
            series: index
                .breakdown
                .iter()
                .map(|s| SnapshotSeries {
                    id: s.series,
                    raw: s.raw.is_finite().then_some(s.raw),
                    normalized: s.normalized,
                    is_placeholder: s.is_placeholder,
                    weight: s.weight,
                })
                .collect(),
            scoring_fingerprint: scoring_fingerprint.into(),
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Single-slot store for the latest snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the stored snapshot.
    pub fn write(&self, record: &SnapshotRecord) -> Result<(), PersistError> {
        let bytes = record.to_json_bytes().map_err(|e| PersistError::Encode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.path, &bytes)
    }

    /// Read the stored snapshot, `None` if none has been written yet.
    pub fn read(&self) -> Result<Option<SnapshotRecord>, PersistError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::io(&self.path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }
}
