//! Daily history — CSV with one row per date and upsert-by-date writes.
//!
//! Columns: `date, composite_score, band, equity, volatility,
//! financial_conditions, ipo_count` (the last four are normalized
//! sub-scores). Re-running on a date that already has a row replaces that
//! row in place, so repeated runs on the same day never duplicate.
//!
//! The file is small (one row per day), so every write reads it fully,
//! applies the upsert in memory and atomically replaces the whole file.

use crate::persist::{write_atomic, PersistError};
use bubble_core::{Band, CompositeIndex, SeriesId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default history location, relative to the working directory.
pub const DEFAULT_HISTORY_PATH: &str = "data/bubble_daily.csv";

/// One day of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub composite_score: f64,
    pub band: Band,
    pub equity: f64,
    pub volatility: f64,
    pub financial_conditions: f64,
    pub ipo_count: f64,
}

impl HistoryRow {
    pub fn from_index(index: &CompositeIndex) -> Self {
        let sub = |id: SeriesId| index.sub_score(id).map_or(f64::NAN, |s| s.normalized);
        Self {
            date: index.as_of,
            composite_score: index.score,
            band: index.band,
            equity: sub(SeriesId::Equity),
            volatility: sub(SeriesId::Volatility),
            financial_conditions: sub(SeriesId::FinancialConditions),
            ipo_count: sub(SeriesId::IpoCount),
        }
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Insert `row` keeping date order, or replace the row with the same date.
///
/// Rows are expected in ascending date order (as written by this module);
/// the new row goes after every row with an earlier date, which is an
/// append in the normal case.
pub fn upsert_by_date(rows: &mut Vec<HistoryRow>, row: HistoryRow) -> Upsert {
    if let Some(existing) = rows.iter_mut().find(|r| r.date == row.date) {
        *existing = row;
        return Upsert::Replaced;
    }
    let at = rows.partition_point(|r| r.date < row.date);
    rows.insert(at, row);
    Upsert::Inserted
}

/// CSV history file manager.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all rows. A missing or empty file is an empty history.
    pub fn read_all(&self) -> Result<Vec<HistoryRow>, PersistError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistError::io(&self.path, e)),
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        reader
            .deserialize()
            .collect::<Result<Vec<HistoryRow>, _>>()
            .map_err(|e| PersistError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Serialize rows (header always included).
    fn encode(&self, rows: &[HistoryRow]) -> Result<Vec<u8>, PersistError> {
        let encode_err = |reason: String| PersistError::Encode {
            path: self.path.clone(),
            reason,
        };
        let mut wtr = csv::Writer::from_writer(vec![]);
        // serde-driven headers are only emitted with the first record
        if rows.is_empty() {
            wtr.write_record([
                "date",
                "composite_score",
                "band",
                "equity",
                "volatility",
                "financial_conditions",
                "ipo_count",
            ])
            .map_err(|e| encode_err(e.to_string()))?;
        }
        for row in rows {
            wtr.serialize(row).map_err(|e| encode_err(e.to_string()))?;
        }
        wtr.into_inner().map_err(|e| encode_err(e.to_string()))
    }

    /// Atomically replace the file with `rows`.
    pub fn write_all(&self, rows: &[HistoryRow]) -> Result<(), PersistError> {
        let bytes = self.encode(rows)?;
        write_atomic(&self.path, &bytes)
    }

    /// Read, upsert `row`, write back. Returns what happened and the new row
    /// count.
    pub fn upsert(&self, row: HistoryRow) -> Result<(Upsert, usize), PersistError> {
        let mut rows = self.read_all()?;
        let outcome = upsert_by_date(&mut rows, row);
        self.write_all(&rows)?;
        Ok((outcome, rows.len()))
    }
}
