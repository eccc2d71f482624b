//! Acquisition: one fetch per series, degraded to placeholders on failure.

use super::provider::{FetchError, SeriesSource};
use crate::series::{RawObservation, SeriesId};
use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;

/// A fetch failed while placeholders were disallowed.
#[derive(Debug, Error)]
#[error("{series} ({provider}): {source}")]
pub struct AcquisitionError {
    pub series: SeriesId,
    pub provider: String,
    #[source]
    pub source: FetchError,
}

/// Fetch every source once, concurrently.
///
/// With `allow_placeholders`, a failed fetch (including a missing credential)
/// yields the series' fallback value flagged as a placeholder. Without it,
/// the first failure in breakdown order is returned and no observations are
/// produced.
///
/// Observations come back sorted in breakdown order.
pub fn acquire(
    sources: &[Box<dyn SeriesSource>],
    allow_placeholders: bool,
) -> Result<Vec<RawObservation>, AcquisitionError> {
    let mut outcomes: Vec<_> = sources
        .par_iter()
        .map(|source| {
            let result = source.fetch();
            (source.series(), source.provider().to_string(), result, Utc::now())
        })
        .collect();
    outcomes.sort_by_key(|(series, ..)| *series);

    let mut observations = Vec::with_capacity(outcomes.len());
    for (series, provider, result, fetched_at) in outcomes {
        match result {
            Ok(value) => {
                tracing::info!(%series, %provider, value, "fetched live value");
                observations.push(RawObservation::live(series, value, fetched_at));
            }
            Err(source) if allow_placeholders => {
                let placeholder = RawObservation::placeholder(series, fetched_at);
                tracing::warn!(
                    %series,
                    %provider,
                    error = %source,
                    value = placeholder.value,
                    "fetch failed; using placeholder"
                );
                observations.push(placeholder);
            }
            Err(source) => {
                return Err(AcquisitionError {
                    series,
                    provider,
                    source,
                });
            }
        }
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        series: SeriesId,
        value: Option<f64>,
    }

    impl SeriesSource for Stub {
        fn series(&self) -> SeriesId {
            self.series
        }

        fn provider(&self) -> &str {
            "stub"
        }

        fn fetch(&self) -> Result<f64, FetchError> {
            self.value
                .ok_or_else(|| FetchError::Network("connection refused".into()))
        }
    }

    fn sources(values: [Option<f64>; 4]) -> Vec<Box<dyn SeriesSource>> {
        SeriesId::ALL
            .into_iter()
            .zip(values)
            .rev()
            .map(|(series, value)| Box::new(Stub { series, value }) as Box<dyn SeriesSource>)
            .collect()
    }

    #[test]
    fn live_values_in_breakdown_order() {
        let obs = acquire(&sources([Some(0.1), Some(20.0), Some(-0.3), Some(8.0)]), true).unwrap();
        let ids: Vec<_> = obs.iter().map(|o| o.series).collect();
        assert_eq!(ids, SeriesId::ALL.to_vec());
        assert!(obs.iter().all(|o| !o.is_placeholder));
        assert_eq!(obs[1].value, 20.0);
    }

    #[test]
    fn failures_become_placeholders_when_allowed() {
        let obs = acquire(&sources([Some(0.1), None, Some(-0.3), None]), true).unwrap();
        assert!(!obs[0].is_placeholder);
        assert!(obs[1].is_placeholder);
        assert_eq!(obs[1].value, SeriesId::Volatility.fallback_value());
        assert!(obs[3].is_placeholder);
        assert_eq!(obs[3].value, SeriesId::IpoCount.fallback_value());
    }

    #[test]
    fn failure_aborts_when_disallowed() {
        let err = acquire(&sources([Some(0.1), Some(20.0), None, None]), false).unwrap_err();
        assert_eq!(err.series, SeriesId::FinancialConditions);
        assert_eq!(err.provider, "stub");
    }

    #[test]
    fn missing_credential_degrades_like_any_failure() {
        struct NoKey;
        impl SeriesSource for NoKey {
            fn series(&self) -> SeriesId {
                SeriesId::Equity
            }
            fn provider(&self) -> &str {
                "finnhub"
            }
            fn fetch(&self) -> Result<f64, FetchError> {
                Err(FetchError::CredentialMissing("FINNHUB_API_KEY"))
            }
        }
        let sources: Vec<Box<dyn SeriesSource>> = vec![Box::new(NoKey)];
        let obs = acquire(&sources, true).unwrap();
        assert!(obs[0].is_placeholder);
        assert!(acquire(&sources, false).is_err());
    }

    #[test]
    fn upstream_failures_degrade_to_placeholders() {
        use crate::data::test_server::{respond_once, silent};
        use crate::data::{http_client, EquityDeviation, Finnhub, Fred, FredSeries};
        use std::sync::Arc;
        use std::time::Duration;

        let client = http_client(Duration::from_secs(1)).unwrap();
        let key = Some("test-key".to_string());
        let finnhub = Arc::new(Finnhub::new(client.clone(), key.clone()).with_base_url(silent()));
        let fred_500 = Arc::new(
            Fred::new(client.clone(), key.clone())
                .with_base_url(respond_once("500 Internal Server Error", "")),
        );
        let fred_garbage = Arc::new(
            Fred::new(client, key).with_base_url(respond_once("200 OK", "not json")),
        );
        let sources: Vec<Box<dyn SeriesSource>> = vec![
            Box::new(EquityDeviation::new(finnhub)),
            Box::new(FredSeries::vix(fred_500)),
            Box::new(FredSeries::anfci(fred_garbage)),
        ];

        let obs = acquire(&sources, true).unwrap();
        assert_eq!(obs.len(), 3);
        for o in &obs {
            assert!(o.is_placeholder, "{} should be a placeholder", o.series);
            assert_eq!(o.value, o.series.fallback_value());
        }
    }

    #[test]
    fn upstream_status_surfaces_when_placeholders_disallowed() {
        use crate::data::test_server::respond_once;
        use crate::data::{http_client, Fred, FredSeries};
        use std::sync::Arc;
        use std::time::Duration;

        let client = http_client(Duration::from_secs(1)).unwrap();
        let fred = Fred::new(client, Some("test-key".to_string()))
            .with_base_url(respond_once("503 Service Unavailable", ""));
        let sources: Vec<Box<dyn SeriesSource>> = vec![Box::new(FredSeries::vix(Arc::new(fred)))];

        let err = acquire(&sources, false).unwrap_err();
        assert_eq!(err.series, SeriesId::Volatility);
        assert_eq!(err.provider, "fred");
        assert!(matches!(
            err.source,
            FetchError::HttpStatus { status: 503, .. }
        ));
    }
}
