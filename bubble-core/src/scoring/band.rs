//! Severity bands for the composite score.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named range of the composite index, in ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Calm,
    Elevated,
    Frothy,
    Bubble,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::Calm, Band::Elevated, Band::Frothy, Band::Bubble];

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Calm => "calm",
            Band::Elevated => "elevated",
            Band::Frothy => "frothy",
            Band::Bubble => "bubble",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Band::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown band '{s}'"))
    }
}

/// Lower bound (inclusive) of each band, ascending. Each band runs up to the
/// next band's lower bound (exclusive); the last band is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub calm: f64,
    pub elevated: f64,
    pub frothy: f64,
    pub bubble: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            calm: 0.0,
            elevated: 25.0,
            frothy: 50.0,
            bubble: 75.0,
        }
    }
}

impl BandThresholds {
    /// Lower bounds paired with their band, in ascending order.
    pub fn lower_bounds(&self) -> [(Band, f64); 4] {
        [
            (Band::Calm, self.calm),
            (Band::Elevated, self.elevated),
            (Band::Frothy, self.frothy),
            (Band::Bubble, self.bubble),
        ]
    }

    /// Classify a score. Scores below the first threshold land in the lowest
    /// band.
    pub fn classify(&self, score: f64) -> Band {
        self.lower_bounds()
            .into_iter()
            .rev()
            .find(|&(_, lower)| score >= lower)
            .map_or(Band::Calm, |(band, _)| band)
    }
}
