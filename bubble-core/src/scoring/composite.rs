//! Composite index: weighted sum of sub-scores, classified into a band.

use super::band::Band;
use super::ScoringConfig;
use crate::series::{RawObservation, SeriesId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Computation errors. All are fatal for the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    #[error("malformed input for '{series}': {value} is not a finite number")]
    MalformedInput { series: SeriesId, value: f64 },

    #[error("no observation for '{0}'")]
    MissingSeries(SeriesId),

    #[error("more than one observation for '{0}'")]
    DuplicateSeries(SeriesId),
}

/// One series mapped onto the common 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub series: SeriesId,
    pub raw: f64,
    /// In [0, 100], rounded to two decimals.
    pub normalized: f64,
    pub weight: f64,
    pub is_placeholder: bool,
}

/// Headline number, its band, and the breakdown that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub as_of: NaiveDate,
    /// In [0, 100], rounded to two decimals.
    pub score: f64,
    pub band: Band,
    /// One entry per series, in `SeriesId::ALL` order.
    pub breakdown: Vec<SubScore>,
}

impl CompositeIndex {
    pub fn sub_score(&self, series: SeriesId) -> Option<&SubScore> {
        self.breakdown.iter().find(|s| s.series == series)
    }

    pub fn placeholder_count(&self) -> usize {
        self.breakdown.iter().filter(|s| s.is_placeholder).count()
    }

    pub fn all_placeholders(&self) -> bool {
        self.placeholder_count() == self.breakdown.len()
    }
}

/// Round to two decimal places.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build the composite index from one observation per series.
///
/// `config` is assumed valid (`ScoringConfig::validate`). The composite is
/// the weighted sum of the rounded sub-scores, so it can be recomputed from
/// the persisted breakdown.
pub fn compose(
    observations: &[RawObservation],
    config: &ScoringConfig,
    as_of: NaiveDate,
) -> Result<CompositeIndex, ComposeError> {
    let mut breakdown = Vec::with_capacity(SeriesId::ALL.len());

    for series in SeriesId::ALL {
        let mut matching = observations.iter().filter(|o| o.series == series);
        let obs = matching
            .next()
            .ok_or(ComposeError::MissingSeries(series))?;
        if matching.next().is_some() {
            return Err(ComposeError::DuplicateSeries(series));
        }
        if !obs.value.is_finite() {
            return Err(ComposeError::MalformedInput {
                series,
                value: obs.value,
            });
        }

        breakdown.push(SubScore {
            series,
            raw: obs.value,
            normalized: round2(config.anchors.get(series).normalize(obs.value)),
            weight: *config.weights.get(series),
            is_placeholder: obs.is_placeholder,
        });
    }

    let weighted: f64 = breakdown.iter().map(|s| s.normalized * s.weight).sum();
    let score = round2(weighted.clamp(super::SCORE_MIN, super::SCORE_MAX));
    let band = config.bands.classify(score);

    Ok(CompositeIndex {
        as_of,
        score,
        band,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn observations(values: [f64; 4]) -> Vec<RawObservation> {
        let now = Utc::now();
        SeriesId::ALL
            .into_iter()
            .zip(values)
            .map(|(id, v)| RawObservation::live(id, v, now))
            .collect()
    }

    #[test]
    fn reference_inputs_score() {
        let index = compose(
            &observations([0.05, 35.0, -0.2, 12.0]),
            &ScoringConfig::default(),
            date(),
        )
        .unwrap();

        let normalized: Vec<f64> = index.breakdown.iter().map(|s| s.normalized).collect();
        assert_eq!(normalized, vec![40.0, 0.0, 58.33, 40.0]);
        assert!((index.score - 32.75).abs() < 1e-9);
        assert_eq!(index.band, Band::Elevated);
        assert_eq!(index.placeholder_count(), 0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let config = ScoringConfig::default();
        let mut obs = observations([0.1, 20.0, -0.5, 25.0]);
        let forward = compose(&obs, &config, date()).unwrap();
        obs.reverse();
        let reversed = compose(&obs, &config, date()).unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn nan_is_malformed() {
        let err = compose(
            &observations([0.05, f64::NAN, -0.2, 12.0]),
            &ScoringConfig::default(),
            date(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::MalformedInput {
                series: SeriesId::Volatility,
                ..
            }
        ));
    }

    #[test]
    fn missing_and_duplicate_series_rejected() {
        let config = ScoringConfig::default();
        let mut obs = observations([0.05, 35.0, -0.2, 12.0]);
        obs.pop();
        assert_eq!(
            compose(&obs, &config, date()).unwrap_err(),
            ComposeError::MissingSeries(SeriesId::IpoCount)
        );

        let mut obs = observations([0.05, 35.0, -0.2, 12.0]);
        obs.push(obs[0].clone());
        assert_eq!(
            compose(&obs, &config, date()).unwrap_err(),
            ComposeError::DuplicateSeries(SeriesId::Equity)
        );
    }

    #[test]
    fn placeholder_flags_carried_through() {
        let now = Utc::now();
        let obs: Vec<_> = SeriesId::ALL
            .into_iter()
            .map(|id| RawObservation::placeholder(id, now))
            .collect();
        let index = compose(&obs, &ScoringConfig::default(), date()).unwrap();
        assert!(index.all_placeholders());
        assert!(index.breakdown.iter().all(|s| s.is_placeholder));
    }

    #[test]
    fn extreme_inputs_saturate() {
        let config = ScoringConfig::default();
        let hot = compose(&observations([1.0, 5.0, -3.0, 400.0]), &config, date()).unwrap();
        assert_eq!(hot.score, 100.0);
        assert_eq!(hot.band, Band::Bubble);

        let cold = compose(&observations([-0.5, 80.0, 3.0, 0.0]), &config, date()).unwrap();
        assert_eq!(cold.score, 0.0);
        assert_eq!(cold.band, Band::Calm);
    }
}
