//! Tracked series and the raw observations fetched for them each run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four series that feed the bubble index.
///
/// Declaration order is the breakdown order used in the snapshot and the
/// history columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesId {
    /// QQQ deviation from its 200-day simple moving average (fraction).
    Equity,
    /// VIX close (FRED `VIXCLS`).
    Volatility,
    /// Chicago Fed adjusted national financial conditions index (FRED `ANFCI`).
    FinancialConditions,
    /// IPOs on the calendar over the trailing 30 days.
    IpoCount,
}

impl SeriesId {
    /// All series in breakdown order.
    pub const ALL: [SeriesId; 4] = [
        SeriesId::Equity,
        SeriesId::Volatility,
        SeriesId::FinancialConditions,
        SeriesId::IpoCount,
    ];

    /// Stable identifier used in artifacts and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesId::Equity => "equity",
            SeriesId::Volatility => "volatility",
            SeriesId::FinancialConditions => "financial_conditions",
            SeriesId::IpoCount => "ipo_count",
        }
    }

    /// Value substituted when a live fetch is unavailable.
    pub fn fallback_value(self) -> f64 {
        match self {
            SeriesId::Equity => 0.0,
            SeriesId::Volatility => 17.5,
            SeriesId::FinancialConditions => -0.2,
            SeriesId::IpoCount => 0.0,
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single raw value for one series, as produced by acquisition.
///
/// Never mutated after creation; discarded once the run has persisted its
/// derived outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub series: SeriesId,
    /// May be NaN if a provider returned something unusable; the composer
    /// rejects non-finite values.
    pub value: f64,
    pub is_placeholder: bool,
    pub fetched_at: DateTime<Utc>,
}

impl RawObservation {
    /// Observation backed by a successful fetch.
    pub fn live(series: SeriesId, value: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            series,
            value,
            is_placeholder: false,
            fetched_at,
        }
    }

    /// Observation carrying the series' fallback value.
    pub fn placeholder(series: SeriesId, fetched_at: DateTime<Utc>) -> Self {
        Self {
            series,
            value: series.fallback_value(),
            is_placeholder: true,
            fetched_at,
        }
    }
}
