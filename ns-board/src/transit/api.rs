//! The transit API seam.
//!
//! Everything above the HTTP layer (station directory, polling) is generic
//! over [`TransitApi`], so it runs the same against [`TransitClient`] and
//! the in-memory mock.
//!
//! [`TransitClient`]: super::TransitClient

use std::future::Future;

use serde::Serialize;

use crate::domain::{Departure, Station, StationCode, Vehicle};

use super::error::TransitError;

/// Default number of journeys requested per board.
pub const DEFAULT_MAX_JOURNEYS: u32 = 20;

/// Default search radius for nearby vehicles, in kilometres.
pub const DEFAULT_RADIUS_KM: u32 = 50;

/// Default maximum number of vehicles returned.
pub const DEFAULT_VEHICLE_LIMIT: u32 = 50;

/// Typed access to the NS API.
pub trait TransitApi: Send + Sync + 'static {
    /// All stations in the operating country, in upstream order.
    fn list_stations(&self) -> impl Future<Output = Result<Vec<Station>, TransitError>> + Send;

    /// Departure board for a station.
    fn list_departures(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<Departure>, TransitError>> + Send;

    /// Arrival board for a station. `destination_name` holds the origin.
    fn list_arrivals(
        &self,
        station: &StationCode,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<Departure>, TransitError>> + Send;

    /// Live train positions around a point.
    fn list_nearby_vehicles(
        &self,
        query: &VehicleQuery,
    ) -> impl Future<Output = Result<Vec<Vehicle>, TransitError>> + Send;
}

/// Parameters for a nearby-vehicles request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: u32,
    pub limit: u32,
}

impl VehicleQuery {
    /// Query around a point with the default radius and limit.
    pub fn around(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km: DEFAULT_RADIUS_KM,
            limit: DEFAULT_VEHICLE_LIMIT,
        }
    }

    /// Query around a station's position.
    pub fn around_station(station: &Station) -> Self {
        Self::around(station.latitude, station.longitude)
    }

    pub fn with_radius_km(mut self, radius_km: u32) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// The radius as sent upstream, which expects meters.
    pub fn radius_meters(&self) -> u64 {
        u64::from(self.radius_km) * 1000
    }

    /// Reject queries the API would refuse or misinterpret.
    pub fn validate(&self) -> Result<(), TransitError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TransitError::InvalidRequest(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TransitError::InvalidRequest(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if self.radius_km == 0 {
            return Err(TransitError::InvalidRequest(
                "radius must be positive".to_string(),
            ));
        }
        check_limit(self.limit)
    }
}

/// Result limits must be positive.
pub(crate) fn check_limit(limit: u32) -> Result<(), TransitError> {
    if limit == 0 {
        return Err(TransitError::InvalidRequest(
            "result limit must be positive".to_string(),
        ));
    }
    Ok(())
}
