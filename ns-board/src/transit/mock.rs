//! Mock NS client for testing without API access.
//!
//! Serves canned JSON responses as if they were live API responses. The
//! responses go through the same normalizer as the real client, and every
//! call is counted so tests can assert on how often the network would have
//! been hit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{Departure, Station, StationCode, Vehicle};
use crate::normalize;

use super::api::{TransitApi, VehicleQuery, check_limit};
use super::error::TransitError;

/// The four upstream endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Stations,
    Departures,
    Arrivals,
    Vehicles,
}

#[derive(Default)]
struct MockState {
    stations: Option<Value>,
    departures: HashMap<StationCode, Value>,
    arrivals: HashMap<StationCode, Value>,
    vehicles: Option<Value>,
    /// Response latency per station code.
    delays: HashMap<StationCode, Duration>,
    /// Latency for station-less endpoints.
    default_delay: Duration,
    /// Endpoints that currently answer with this HTTP status.
    failures: HashMap<Endpoint, u16>,
}

#[derive(Default)]
struct Counters {
    stations: AtomicUsize,
    departures: AtomicUsize,
    arrivals: AtomicUsize,
    vehicles: AtomicUsize,
}

/// Mock NS client that serves canned JSON.
///
/// Unknown stations answer with a 404, as the real API does.
#[derive(Clone)]
pub struct MockTransitClient {
    state: Arc<RwLock<MockState>>,
    counters: Arc<Counters>,
    country: String,
}

impl MockTransitClient {
    /// Create an empty mock filtering stations to `NL`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            counters: Arc::new(Counters::default()),
            country: "NL".to_string(),
        }
    }

    /// Filter stations to another country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Set the raw `/stations` response.
    pub async fn set_stations(&self, root: Value) {
        self.state.write().await.stations = Some(root);
    }

    /// Set the raw `/departures` response for a station.
    pub async fn set_departures(&self, station: &StationCode, root: Value) {
        self.state
            .write()
            .await
            .departures
            .insert(station.clone(), root);
    }

    /// Set the raw `/arrivals` response for a station.
    pub async fn set_arrivals(&self, station: &StationCode, root: Value) {
        self.state
            .write()
            .await
            .arrivals
            .insert(station.clone(), root);
    }

    /// Set the raw `/vehicle` response.
    pub async fn set_vehicles(&self, root: Value) {
        self.state.write().await.vehicles = Some(root);
    }

    /// Delay board responses for one station.
    pub async fn set_delay(&self, station: &StationCode, delay: Duration) {
        self.state
            .write()
            .await
            .delays
            .insert(station.clone(), delay);
    }

    /// Delay station and vehicle responses.
    pub async fn set_default_delay(&self, delay: Duration) {
        self.state.write().await.default_delay = delay;
    }

    /// Make an endpoint answer with an HTTP error until cleared.
    pub async fn fail_with_status(&self, endpoint: Endpoint, status: u16) {
        self.state.write().await.failures.insert(endpoint, status);
    }

    /// Stop injecting failures.
    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    /// Number of calls made to an endpoint so far.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        let counter = match endpoint {
            Endpoint::Stations => &self.counters.stations,
            Endpoint::Departures => &self.counters.departures,
            Endpoint::Arrivals => &self.counters.arrivals,
            Endpoint::Vehicles => &self.counters.vehicles,
        };
        counter.load(Ordering::SeqCst)
    }

    fn record_call(&self, endpoint: Endpoint) {
        let counter = match endpoint {
            Endpoint::Stations => &self.counters.stations,
            Endpoint::Departures => &self.counters.departures,
            Endpoint::Arrivals => &self.counters.arrivals,
            Endpoint::Vehicles => &self.counters.vehicles,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Look up the canned response for a call, after its delay.
    async fn respond(
        &self,
        endpoint: Endpoint,
        station: Option<&StationCode>,
    ) -> Result<Value, TransitError> {
        self.record_call(endpoint);

        let delay = {
            let state = self.state.read().await;
            station
                .and_then(|s| state.delays.get(s).copied())
                .unwrap_or(state.default_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        if let Some(&status) = state.failures.get(&endpoint) {
            return Err(TransitError::HttpStatus {
                status,
                body: "injected failure".to_string(),
            });
        }

        let found = match (endpoint, station) {
            (Endpoint::Stations, _) => state.stations.clone(),
            (Endpoint::Vehicles, _) => state.vehicles.clone(),
            (Endpoint::Departures, Some(code)) => state.departures.get(code).cloned(),
            (Endpoint::Arrivals, Some(code)) => state.arrivals.get(code).cloned(),
            (_, None) => None,
        };

        found.ok_or_else(|| TransitError::HttpStatus {
            status: 404,
            body: format!(
                "no mock data for {:?} {}",
                endpoint,
                station.map(StationCode::as_str).unwrap_or("")
            ),
        })
    }
}

impl Default for MockTransitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitApi for MockTransitClient {
    async fn list_stations(&self) -> Result<Vec<Station>, TransitError> {
        let root = self.respond(Endpoint::Stations, None).await?;
        let stations = normalize::stations_payload(&root)?;
        Ok(stations
            .into_iter()
            .filter(|s| s.is_in(&self.country))
            .collect())
    }

    async fn list_departures(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> Result<Vec<Departure>, TransitError> {
        check_limit(max_results)?;
        let root = self.respond(Endpoint::Departures, Some(station)).await?;
        let mut departures = normalize::departures_payload(&root)?;
        departures.truncate(max_results as usize);
        Ok(departures)
    }

    async fn list_arrivals(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> Result<Vec<Departure>, TransitError> {
        check_limit(max_results)?;
        let root = self.respond(Endpoint::Arrivals, Some(station)).await?;
        let mut arrivals = normalize::arrivals_payload(&root)?;
        arrivals.truncate(max_results as usize);
        Ok(arrivals)
    }

    async fn list_nearby_vehicles(
        &self,
        query: &VehicleQuery,
    ) -> Result<Vec<Vehicle>, TransitError> {
        query.validate()?;
        let root = self.respond(Endpoint::Vehicles, None).await?;
        let mut vehicles = normalize::vehicles_payload(&root)?;
        vehicles.truncate(query.limit as usize);
        Ok(vehicles)
    }
}
