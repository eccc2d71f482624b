//! Upstream data providers and acquisition

pub mod acquire;
pub mod finnhub;
pub mod fred;
pub mod provider;

#[cfg(test)]
pub(crate) mod test_server;

pub use acquire::{acquire, AcquisitionError};
pub use finnhub::{EquityDeviation, Finnhub, IpoActivity};
pub use fred::{Fred, FredSeries};
pub use provider::{http_client, FetchError, SeriesSource, DEFAULT_TIMEOUT};

use std::sync::Arc;
use std::time::Duration;

/// Credentials and timeout for the live providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub finnhub_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub timeout: Option<Duration>,
}

/// The four live sources, one per series, sharing one HTTP client.
///
/// Missing credentials are not an error here; the affected sources fail at
/// fetch time like any other unavailable provider.
pub fn live_sources(settings: &ProviderSettings) -> Result<Vec<Box<dyn SeriesSource>>, FetchError> {
    let client = http_client(settings.timeout.unwrap_or(DEFAULT_TIMEOUT))?;
    let finnhub = Arc::new(Finnhub::new(
        client.clone(),
        settings.finnhub_api_key.clone(),
    ));
    let fred = Arc::new(Fred::new(client, settings.fred_api_key.clone()));

    Ok(vec![
        Box::new(EquityDeviation::new(Arc::clone(&finnhub))),
        Box::new(FredSeries::vix(Arc::clone(&fred))),
        Box::new(FredSeries::anfci(fred)),
        Box::new(IpoActivity::new(finnhub)),
    ])
}
