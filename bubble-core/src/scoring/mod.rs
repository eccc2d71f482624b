//! Scoring: per-series normalization, weighted composite, and band
//! classification.
//!
//! All tuning constants live in [`ScoringConfig`]. The built-in defaults can
//! be overridden from a TOML file:
//!
//! ```toml
//! [anchors.volatility]
//! low = 12.0
//! high = 35.0
//! polarity = "inverse"
//!
//! [weights]
//! equity = 0.45
//! volatility = 0.25
//! financial_conditions = 0.15
//! ipo_count = 0.15
//!
//! [bands]
//! calm = 0.0
//! elevated = 25.0
//! frothy = 50.0
//! bubble = 75.0
//! ```

pub mod band;
pub mod composite;
pub mod normalize;

pub use band::{Band, BandThresholds};
pub use composite::{compose, CompositeIndex, ComposeError, SubScore};
pub use normalize::{Anchor, Polarity, SCORE_MAX, SCORE_MIN};

use crate::series::SeriesId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tolerance on the weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// One value per tracked series. Every series is always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerSeries<T> {
    pub equity: T,
    pub volatility: T,
    pub financial_conditions: T,
    pub ipo_count: T,
}

impl<T> PerSeries<T> {
    pub fn get(&self, id: SeriesId) -> &T {
        match id {
            SeriesId::Equity => &self.equity,
            SeriesId::Volatility => &self.volatility,
            SeriesId::FinancialConditions => &self.financial_conditions,
            SeriesId::IpoCount => &self.ipo_count,
        }
    }

    /// Entries in breakdown order.
    pub fn iter(&self) -> impl Iterator<Item = (SeriesId, &T)> {
        SeriesId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Errors from loading or validating a scoring configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scoring config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scoring config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("weights must sum to 1.0 (got {sum})")]
    WeightSum { sum: f64 },

    #[error("weight for '{series}' must be a finite, non-negative number (got {weight})")]
    InvalidWeight { series: SeriesId, weight: f64 },

    #[error("anchors for '{series}' must be finite with low < high (got {low}..{high})")]
    InvalidAnchor { series: SeriesId, low: f64, high: f64 },

    #[error("band thresholds must start at 0 and be strictly ascending")]
    InvalidBands,

    #[error("failed to encode scoring config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Normalization anchors, composite weights and band thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub anchors: PerSeries<Anchor>,
    pub weights: PerSeries<f64>,
    #[serde(default)]
    pub bands: BandThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            anchors: PerSeries {
                equity: Anchor::new(-0.05, 0.20, Polarity::Direct),
                volatility: Anchor::new(12.0, 35.0, Polarity::Inverse),
                financial_conditions: Anchor::new(-0.70, 0.50, Polarity::Inverse),
                ipo_count: Anchor::new(0.0, 30.0, Polarity::Direct),
            },
            weights: PerSeries {
                equity: 0.45,
                volatility: 0.25,
                financial_conditions: 0.15,
                ipo_count: 0.15,
            },
            bands: BandThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML scoring config.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: ScoringConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML scoring config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check the invariants the composer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (series, &weight) in self.weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { series, weight });
            }
        }
        let sum: f64 = self.weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }

        for (series, anchor) in self.anchors.iter() {
            if !anchor.low.is_finite() || !anchor.high.is_finite() || anchor.low >= anchor.high {
                return Err(ConfigError::InvalidAnchor {
                    series,
                    low: anchor.low,
                    high: anchor.high,
                });
            }
        }

        let bounds = self.bands.lower_bounds();
        if bounds[0].1 != 0.0 || bounds.windows(2).any(|w| !(w[0].1 < w[1].1)) {
            return Err(ConfigError::InvalidBands);
        }

        Ok(())
    }

    /// BLAKE3 fingerprint of the canonical JSON form. Two configs that score
    /// identically share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
