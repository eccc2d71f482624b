//! Linear, clamped mapping of a raw series value onto the 0–100 scale.

use serde::{Deserialize, Serialize};

/// Lower bound of every sub-score.
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of every sub-score.
pub const SCORE_MAX: f64 = 100.0;

/// Which way a raw value pushes the sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Higher raw value means a higher (frothier) score.
    Direct,
    /// Higher raw value means a lower (calmer) score.
    Inverse,
}

/// Historical range of a series: raw values at or beyond an anchor map to
/// the corresponding bound exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub low: f64,
    pub high: f64,
    pub polarity: Polarity,
}

impl Anchor {
    pub const fn new(low: f64, high: f64, polarity: Polarity) -> Self {
        Self {
            low,
            high,
            polarity,
        }
    }

    /// Map `raw` onto [0, 100]. `raw` must be finite; the anchors must satisfy
    /// `low < high` (see `ScoringConfig::validate`).
    pub fn normalize(&self, raw: f64) -> f64 {
        let fraction = if raw <= self.low {
            0.0
        } else if raw >= self.high {
            1.0
        } else {
            (raw - self.low) / (self.high - self.low)
        };

        let fraction = match self.polarity {
            Polarity::Direct => fraction,
            Polarity::Inverse => 1.0 - fraction,
        };

        (fraction * SCORE_MAX).clamp(SCORE_MIN, SCORE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIX: Anchor = Anchor::new(12.0, 35.0, Polarity::Inverse);
    const IPO: Anchor = Anchor::new(0.0, 30.0, Polarity::Direct);

    #[test]
    fn direct_hits_bounds_at_anchors() {
        assert_eq!(IPO.normalize(0.0), 0.0);
        assert_eq!(IPO.normalize(30.0), 100.0);
        assert_eq!(IPO.normalize(-5.0), 0.0);
        assert_eq!(IPO.normalize(500.0), 100.0);
    }

    #[test]
    fn inverse_hits_bounds_at_anchors() {
        assert_eq!(VIX.normalize(12.0), 100.0);
        assert_eq!(VIX.normalize(35.0), 0.0);
        assert_eq!(VIX.normalize(9.0), 100.0);
        assert_eq!(VIX.normalize(80.0), 0.0);
    }

    #[test]
    fn interpolates_linearly() {
        assert!((IPO.normalize(15.0) - 50.0).abs() < 1e-12);
        assert!((IPO.normalize(12.0) - 40.0).abs() < 1e-12);
        assert!((VIX.normalize(23.5) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn infinities_clamp() {
        assert_eq!(IPO.normalize(f64::INFINITY), 100.0);
        assert_eq!(IPO.normalize(f64::NEG_INFINITY), 0.0);
    }
}
