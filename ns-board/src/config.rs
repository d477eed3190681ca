//! Process configuration.
//!
//! Everything comes from the environment. The API key is the only required
//! value; a missing key aborts startup rather than surfacing later as a
//! stream of 401s.

use std::time::Duration;

use crate::polling::PollConfig;
use crate::stations::DEFAULT_STATION_CODE;
use crate::transit::TransitConfig;

/// Environment variable holding the NS API subscription key.
pub const API_KEY_VAR: &str = "NS_API_KEY";

/// Configuration errors. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The API key is not set
    #[error("NS_API_KEY is not set. Get a free API key at https://apiportal.ns.nl and export it")]
    MissingApiKey,

    /// The API key cannot be sent as a header value
    #[error("NS_API_KEY contains characters that are not valid in an HTTP header")]
    InvalidApiKey,

    /// An optional setting has an unusable value
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Top-level configuration for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub transit: TransitConfig,
    pub poll: PollConfig,
    /// Station to show when nothing else is selected.
    pub station: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary lookup (for testing).
    ///
    /// Recognised variables:
    /// - `NS_API_KEY` (required)
    /// - `NS_API_BASE_URL`, `NS_VEHICLE_API_BASE_URL`
    /// - `NS_COUNTRY` (default `NL`)
    /// - `NS_REFRESH_SECS` (default 30), `NS_TIMEOUT_SECS` (default 30)
    /// - `NS_STATION` (default `ASD`)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut transit = TransitConfig::new(api_key);
        if let Some(url) = lookup("NS_API_BASE_URL") {
            transit = transit.with_base_url(url);
        }
        if let Some(url) = lookup("NS_VEHICLE_API_BASE_URL") {
            transit = transit.with_vehicle_base_url(url);
        }
        if let Some(country) = lookup("NS_COUNTRY") {
            transit = transit.with_country(country);
        }
        if let Some(secs) = lookup("NS_TIMEOUT_SECS") {
            transit = transit.with_timeout(parse_secs("NS_TIMEOUT_SECS", &secs)?);
        }

        let mut poll = PollConfig::default();
        if let Some(secs) = lookup("NS_REFRESH_SECS") {
            poll.refresh_interval =
                Duration::from_secs(parse_secs("NS_REFRESH_SECS", &secs)?);
        }

        let station = lookup("NS_STATION").unwrap_or_else(|| DEFAULT_STATION_CODE.to_string());

        Ok(Self {
            transit,
            poll,
            station,
        })
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a whole number of seconds",
        }),
    }
}
