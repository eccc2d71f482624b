//! Process configuration, read once at startup.
//!
//! Recognized environment variables:
//! - `FINNHUB_API_KEY`: equity and IPO series (optional)
//! - `FRED_API_KEY`: volatility and financial-conditions series (optional)
//! - `BUBBLE_ALLOW_PLACEHOLDERS`: substitute fallback values on fetch failure (default `true`)
//! - `PORT`: static file server port (default 8080)
//! - `BUBBLE_FETCH_TIMEOUT_SECS`: per-request timeout (default 15)
//!
//! A `.env` file in the working directory is loaded first if present.

use bubble_core::data::{ProviderSettings, DEFAULT_TIMEOUT};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

/// Errors from reading environment configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: expected a boolean (true/false/1/0/yes/no/on/off), got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var}: expected an integer in range, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Everything the run and the server need from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub finnhub_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub allow_placeholders: bool,
    pub port: u16,
    pub fetch_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: None,
            fred_api_key: None,
            allow_placeholders: true,
            port: DEFAULT_PORT,
            fetch_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any), then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let allow_placeholders = match get("BUBBLE_ALLOW_PLACEHOLDERS") {
            Some(v) => parse_bool("BUBBLE_ALLOW_PLACEHOLDERS", &v)?,
            None => defaults.allow_placeholders,
        };

        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                var: "PORT",
                value: v,
            })?,
            None => defaults.port,
        };

        let fetch_timeout = match get("BUBBLE_FETCH_TIMEOUT_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "BUBBLE_FETCH_TIMEOUT_SECS",
                        value: v,
                    })
                }
            },
            None => defaults.fetch_timeout,
        };

        Ok(Self {
            finnhub_api_key: get("FINNHUB_API_KEY"),
            fred_api_key: get("FRED_API_KEY"),
            allow_placeholders,
            port,
            fetch_timeout,
        })
    }

    /// Provider credentials and timeout for acquisition.
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            finnhub_api_key: self.finnhub_api_key.clone(),
            fred_api_key: self.fred_api_key.clone(),
            timeout: Some(self.fetch_timeout),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_all_options() {
        let config = from_pairs(&[
            ("FINNHUB_API_KEY", "fh"),
            ("FRED_API_KEY", "fr"),
            ("BUBBLE_ALLOW_PLACEHOLDERS", "off"),
            ("PORT", "9000"),
            ("BUBBLE_FETCH_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.finnhub_api_key.as_deref(), Some("fh"));
        assert_eq!(config.fred_api_key.as_deref(), Some("fr"));
        assert!(!config.allow_placeholders);
        assert_eq!(config.port, 9000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_credentials_are_unset() {
        let config = from_pairs(&[("FINNHUB_API_KEY", "   ")]).unwrap();
        assert_eq!(config.finnhub_api_key, None);
    }

    #[test]
    fn bool_spellings() {
        for v in ["1", "TRUE", "Yes", "on"] {
            assert!(from_pairs(&[("BUBBLE_ALLOW_PLACEHOLDERS", v)]).unwrap().allow_placeholders);
        }
        for v in ["0", "False", "no", "OFF"] {
            assert!(!from_pairs(&[("BUBBLE_ALLOW_PLACEHOLDERS", v)]).unwrap().allow_placeholders);
        }
        assert!(matches!(
            from_pairs(&[("BUBBLE_ALLOW_PLACEHOLDERS", "maybe")]),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            from_pairs(&[("PORT", "70000")]),
            Err(ConfigError::InvalidNumber { var: "PORT", .. })
        ));
        assert!(matches!(
            from_pairs(&[("BUBBLE_FETCH_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn provider_settings_carry_credentials() {
        let config = from_pairs(&[("FRED_API_KEY", "fr")]).unwrap();
        let settings = config.provider_settings();
        assert_eq!(settings.fred_api_key.as_deref(), Some("fr"));
        assert_eq!(settings.finnhub_api_key, None);
        assert_eq!(settings.timeout, Some(DEFAULT_TIMEOUT));
    }
}
