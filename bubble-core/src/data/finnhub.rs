//! Finnhub provider: QQQ daily candles and the IPO calendar.
//!
//! Both series need `FINNHUB_API_KEY`; without it the fetch fails with
//! `CredentialMissing` before any request is made.

use super::provider::{get_checked, FetchError, SeriesSource};
use crate::series::SeriesId;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

const PROVIDER: &str = "finnhub";
const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Moving-average window for the equity deviation.
pub const SMA_WINDOW: usize = 200;
/// Calendar days of candles requested; enough for `SMA_WINDOW` trading days.
const CANDLE_LOOKBACK_DAYS: i64 = 400;
/// Trailing window for the IPO count.
pub const IPO_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    c: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct IpoCalendarResponse {
    #[serde(rename = "ipoCalendar", default)]
    ipo_calendar: Vec<IpoEvent>,
}

/// One entry of the Finnhub IPO calendar; only the status is consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct IpoEvent {
    pub status: Option<String>,
}

impl IpoEvent {
    fn is_withdrawn(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("withdrawn"))
    }
}

/// Thin Finnhub REST client.
pub struct Finnhub {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl Finnhub {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn token(&self) -> Result<String, FetchError> {
        self.api_key
            .clone()
            .ok_or(FetchError::CredentialMissing("FINNHUB_API_KEY"))
    }

    /// Daily closes for `symbol` between the two unix timestamps, oldest first.
    pub fn daily_closes(&self, symbol: &str, from: i64, to: i64) -> Result<Vec<f64>, FetchError> {
        let token = self.token()?;
        let url = format!("{}/stock/candle", self.base_url);
        let resp = get_checked(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("symbol", symbol.to_string()),
                ("resolution", "D".to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("token", token),
            ],
        )?;
        let body: CandleResponse = resp.json()?;
        parse_candles(body)
    }

    /// IPO calendar entries dated within `[from, to]`.
    pub fn ipo_calendar(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<IpoEvent>, FetchError> {
        let token = self.token()?;
        let url = format!("{}/calendar/ipo", self.base_url);
        let resp = get_checked(
            &self.client,
            PROVIDER,
            &url,
            &[
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("token", token),
            ],
        )?;
        let body: IpoCalendarResponse = resp.json()?;
        Ok(body.ipo_calendar)
    }
}

fn parse_candles(body: CandleResponse) -> Result<Vec<f64>, FetchError> {
    if body.s != "ok" {
        return Err(FetchError::ResponseFormat(format!(
            "candle status '{}'",
            body.s
        )));
    }
    Ok(body.c)
}

/// Deviation of the latest close from the trailing `window`-close simple
/// moving average: `latest / sma - 1`.
pub fn deviation_from_sma(closes: &[f64], window: usize) -> Result<f64, FetchError> {
    if window == 0 || closes.len() < window {
        return Err(FetchError::InsufficientData(format!(
            "{} closes, need at least {window}",
            closes.len()
        )));
    }
    let tail = &closes[closes.len() - window..];
    let sma = tail.iter().sum::<f64>() / window as f64;
    if !sma.is_finite() || sma <= 0.0 {
        return Err(FetchError::ResponseFormat(format!(
            "moving average {sma} is not a positive number"
        )));
    }
    let latest = tail[window - 1];
    Ok(latest / sma - 1.0)
}

/// IPOs that were not withdrawn.
pub fn count_active_ipos(events: &[IpoEvent]) -> usize {
    events.iter().filter(|e| !e.is_withdrawn()).count()
}

/// Equity series: QQQ deviation from its 200-day SMA.
pub struct EquityDeviation {
    finnhub: Arc<Finnhub>,
    symbol: String,
}

impl EquityDeviation {
    pub fn new(finnhub: Arc<Finnhub>) -> Self {
        Self {
            finnhub,
            symbol: "QQQ".to_string(),
        }
    }
}

impl SeriesSource for EquityDeviation {
    fn series(&self) -> SeriesId {
        SeriesId::Equity
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self) -> Result<f64, FetchError> {
        let now = Utc::now().timestamp();
        let from = now - CANDLE_LOOKBACK_DAYS * 24 * 60 * 60;
        let closes = self.finnhub.daily_closes(&self.symbol, from, now)?;
        let deviation = deviation_from_sma(&closes, SMA_WINDOW)?;
        tracing::debug!(
            symbol = %self.symbol,
            closes = closes.len(),
            deviation,
            "computed SMA deviation"
        );
        Ok(deviation)
    }
}

/// IPO series: non-withdrawn IPOs over the trailing 30 days.
pub struct IpoActivity {
    finnhub: Arc<Finnhub>,
}

impl IpoActivity {
    pub fn new(finnhub: Arc<Finnhub>) -> Self {
        Self { finnhub }
    }
}

impl SeriesSource for IpoActivity {
    fn series(&self) -> SeriesId {
        SeriesId::IpoCount
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self) -> Result<f64, FetchError> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(IPO_WINDOW_DAYS);
        let events = self.finnhub.ipo_calendar(from, to)?;
        let count = count_active_ipos(&events);
        tracing::debug!(count, listed = events.len(), "IPO calendar window");
        Ok(count as f64)
    }
}
