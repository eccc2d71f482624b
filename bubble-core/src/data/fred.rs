//! FRED provider: latest observation of a named economic series.
//!
//! Used for the VIX close (`VIXCLS`) and the adjusted national financial
//! conditions index (`ANFCI`). Needs `FRED_API_KEY`.

use super::provider::{get_checked, FetchError, SeriesSource};
use crate::series::SeriesId;
use serde::Deserialize;
use std::sync::Arc;

const PROVIDER: &str = "fred";
const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// FRED marks missing observations (e.g. market holidays) with ".".
const MISSING_VALUE: &str = ".";
/// Most recent observations requested; the first non-missing one wins.
const OBSERVATION_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// Thin FRED REST client.
pub struct Fred {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl Fred {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Most recent non-missing value of `series_id`.
    pub fn latest(&self, series_id: &str) -> Result<f64, FetchError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(FetchError::CredentialMissing("FRED_API_KEY"))?;
        let url = format!("{}/series/observations", self.base_url);
        let resp = get_checked(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("series_id", series_id.to_string()),
                ("api_key", api_key),
                ("file_type", "json".to_string()),
                ("sort_order", "desc".to_string()),
                ("limit", OBSERVATION_LIMIT.to_string()),
            ],
        )?;
        let body: ObservationsResponse = resp.json()?;
        latest_value(series_id, &body.observations)
    }
}

/// First parseable, non-missing value in newest-first observations.
fn latest_value(series_id: &str, observations: &[Observation]) -> Result<f64, FetchError> {
    let obs = observations
        .iter()
        .find(|o| o.value.trim() != MISSING_VALUE)
        .ok_or_else(|| {
            FetchError::InsufficientData(format!("no recent values for {series_id}"))
        })?;
    let value: f64 = obs.value.trim().parse().map_err(|_| {
        FetchError::ResponseFormat(format!(
            "{series_id} value '{}' on {} is not numeric",
            obs.value, obs.date
        ))
    })?;
    tracing::debug!(series_id, date = %obs.date, value, "latest FRED observation");
    Ok(value)
}

/// A FRED series bound to one of the tracked series.
pub struct FredSeries {
    fred: Arc<Fred>,
    series: SeriesId,
    series_id: &'static str,
}

impl FredSeries {
    /// VIX daily close.
    pub fn vix(fred: Arc<Fred>) -> Self {
        Self {
            fred,
            series: SeriesId::Volatility,
            series_id: "VIXCLS",
        }
    }

    /// Chicago Fed adjusted national financial conditions index (weekly).
    pub fn anfci(fred: Arc<Fred>) -> Self {
        Self {
            fred,
            series: SeriesId::FinancialConditions,
            series_id: "ANFCI",
        }
    }
}

impl SeriesSource for FredSeries {
    fn series(&self) -> SeriesId {
        self.series
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self) -> Result<f64, FetchError> {
        self.fred.latest(self.series_id)
    }
}
