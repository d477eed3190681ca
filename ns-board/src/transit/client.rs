//! NS API HTTP client.
//!
//! Provides async methods for the NS travel-information and virtual-train
//! APIs. Handles authentication, status classification and conversion to
//! domain types.

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::domain::{Departure, Station, StationCode, Vehicle};
use crate::normalize;

use super::api::{TransitApi, VehicleQuery, check_limit};
use super::error::TransitError;

/// Default base URL for the travel-information API.
const DEFAULT_BASE_URL: &str = "https://gateway.apiportal.ns.nl/reisinformatie-api/api/v2";

/// Default base URL for the virtual-train (live positions) API.
const DEFAULT_VEHICLE_BASE_URL: &str = "https://gateway.apiportal.ns.nl/virtual-train-api";

/// Header carrying the API portal subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";

/// Operating country; the station catalog covers neighbouring countries too.
const DEFAULT_COUNTRY: &str = "NL";

/// How much of an error body to keep.
const MAX_ERROR_BODY: usize = 500;

/// Configuration for the NS client.
#[derive(Debug, Clone)]
pub struct TransitConfig {
    /// Subscription key for the `Ocp-Apim-Subscription-Key` header
    pub api_key: String,
    /// Base URL for stations, departures and arrivals
    pub base_url: String,
    /// Base URL for vehicle positions
    pub vehicle_base_url: String,
    /// Country code stations are filtered to
    pub country: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransitConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            vehicle_base_url: DEFAULT_VEHICLE_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom vehicle API base URL.
    pub fn with_vehicle_base_url(mut self, url: impl Into<String>) -> Self {
        self.vehicle_base_url = url.into();
        self
    }

    /// Set the operating country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// NS API client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    base_url: String,
    vehicle_base_url: String,
    country: String,
}

impl TransitClient {
    /// Create a new client with the given configuration.
    ///
    /// The key is installed as a default header here, once, so a key that
    /// cannot be sent fails at startup instead of on every request.
    pub fn new(config: TransitConfig) -> Result<Self, TransitError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }

        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        headers.insert(HeaderName::from_static(SUBSCRIPTION_KEY_HEADER), api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: trim_slash(config.base_url),
            vehicle_base_url: trim_slash(config.vehicle_base_url),
            country: config.country,
        })
    }

    /// The country stations are filtered to.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// GET a URL and parse the body as JSON, classifying failures.
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransitError> {
        let started = Instant::now();
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            warn!(url, status = status.as_u16(), %body, "NS API request failed");
            return Err(TransitError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(
            url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "NS API response"
        );

        normalize::parse_body(&body).map_err(|cause| {
            warn!(url, error = %cause, "NS API returned a body that is not JSON");
            TransitError::Decode { cause }
        })
    }

    async fn board(
        &self,
        endpoint: &str,
        station: &StationCode,
        max_results: u32,
    ) -> Result<Value, TransitError> {
        check_limit(max_results)?;
        let url = format!("{}/{}", self.base_url, endpoint);
        self.get_json(
            &url,
            &[
                ("station", station.as_str().to_string()),
                ("maxJourneys", max_results.to_string()),
            ],
        )
        .await
    }
}

impl TransitApi for TransitClient {
    async fn list_stations(&self) -> Result<Vec<Station>, TransitError> {
        let url = format!("{}/stations", self.base_url);
        let root = self.get_json(&url, &[]).await?;
        let stations = normalize::stations_payload(&root)?;
        let total = stations.len();

        let stations: Vec<Station> = stations
            .into_iter()
            .filter(|s| s.is_in(&self.country))
            .collect();
        debug!(total, kept = stations.len(), country = %self.country, "filtered station catalog");

        Ok(stations)
    }

    async fn list_departures(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> Result<Vec<Departure>, TransitError> {
        let root = self.board("departures", station, max_results).await?;
        Ok(normalize::departures_payload(&root)?)
    }

    async fn list_arrivals(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> Result<Vec<Departure>, TransitError> {
        let root = self.board("arrivals", station, max_results).await?;
        Ok(normalize::arrivals_payload(&root)?)
    }

    async fn list_nearby_vehicles(
        &self,
        query: &VehicleQuery,
    ) -> Result<Vec<Vehicle>, TransitError> {
        query.validate()?;
        let url = format!("{}/vehicle", self.vehicle_base_url);
        let root = self
            .get_json(
                &url,
                &[
                    ("lat", query.latitude.to_string()),
                    ("lng", query.longitude.to_string()),
                    ("radius", query.radius_meters().to_string()),
                    ("limit", query.limit.to_string()),
                ],
            )
            .await?;
        Ok(normalize::vehicles_payload(&root)?)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
