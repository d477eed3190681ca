//! What a subscription polls.

use std::fmt;
use std::future::Future;

use crate::domain::{Departure, StationCode, Vehicle};
use crate::transit::{DEFAULT_MAX_JOURNEYS, TransitApi, TransitError, VehicleQuery};

/// A pollable source of records.
pub trait Feed: fmt::Display + Clone + Send + Sync + 'static {
    type Record: Clone + Send + Sync + 'static;

    /// Fetch the current records.
    fn fetch<A: TransitApi>(
        &self,
        api: &A,
    ) -> impl Future<Output = Result<Vec<Self::Record>, TransitError>> + Send;
}

/// Which board to show for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardMode {
    Departures,
    Arrivals,
}

impl BoardMode {
    /// The other board.
    pub fn toggled(self) -> Self {
        match self {
            BoardMode::Departures => BoardMode::Arrivals,
            BoardMode::Arrivals => BoardMode::Departures,
        }
    }
}

/// Departure or arrival board for one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFeed {
    pub station: StationCode,
    pub mode: BoardMode,
    pub max_results: u32,
}

impl BoardFeed {
    pub fn departures(station: StationCode) -> Self {
        Self {
            station,
            mode: BoardMode::Departures,
            max_results: DEFAULT_MAX_JOURNEYS,
        }
    }

    pub fn arrivals(station: StationCode) -> Self {
        Self {
            station,
            mode: BoardMode::Arrivals,
            max_results: DEFAULT_MAX_JOURNEYS,
        }
    }

    pub fn with_mode(mut self, mode: BoardMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_station(mut self, station: StationCode) -> Self {
        self.station = station;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

impl fmt::Display for BoardFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            BoardMode::Departures => "departures",
            BoardMode::Arrivals => "arrivals",
        };
        write!(f, "{} {}", mode, self.station)
    }
}

impl Feed for BoardFeed {
    type Record = Departure;

    async fn fetch<A: TransitApi>(&self, api: &A) -> Result<Vec<Departure>, TransitError> {
        match self.mode {
            BoardMode::Departures => api.list_departures(&self.station, self.max_results).await,
            BoardMode::Arrivals => api.list_arrivals(&self.station, self.max_results).await,
        }
    }
}

/// Live train positions around a point.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFeed {
    pub query: VehicleQuery,
}

impl VehicleFeed {
    pub fn new(query: VehicleQuery) -> Self {
        Self { query }
    }
}

impl fmt::Display for VehicleFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vehicles within {} km of ({:.4}, {:.4})",
            self.query.radius_km, self.query.latitude, self.query.longitude
        )
    }
}

impl Feed for VehicleFeed {
    type Record = Vehicle;

    async fn fetch<A: TransitApi>(&self, api: &A) -> Result<Vec<Vehicle>, TransitError> {
        api.list_nearby_vehicles(&self.query).await
    }
}
