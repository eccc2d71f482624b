//! Series source trait and structured fetch errors.
//!
//! A `SeriesSource` fetches the current raw value of exactly one series.
//! Implementations live next to this module (Finnhub, FRED); tests use
//! in-memory stubs.

use crate::series::SeriesId;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a live value could not be obtained.
///
/// Acquisition treats every variant the same way (placeholder or abort);
/// the distinction is only for diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("credential missing: {0}")]
    CredentialMissing(&'static str),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP {status} from {provider}")]
    HttpStatus { provider: &'static str, status: u16 },

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_decode() {
            FetchError::ResponseFormat(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus {
                provider: "upstream",
                status: status.as_u16(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Fetches the latest raw value for one series.
pub trait SeriesSource: Send + Sync {
    /// The series this source produces.
    fn series(&self) -> SeriesId;

    /// Human-readable provider name for logs.
    fn provider(&self) -> &str;

    /// One attempt, no retries.
    fn fetch(&self) -> Result<f64, FetchError>;
}

/// Build the blocking HTTP client shared by the providers.
pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bubble-index/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send a GET and check the status, mapping failures onto `FetchError`.
pub(crate) fn get_checked(
    client: &reqwest::blocking::Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<reqwest::blocking::Response, FetchError> {
    let resp = client.get(url).query(query).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            provider,
            status: status.as_u16(),
        });
    }
    Ok(resp)
}
