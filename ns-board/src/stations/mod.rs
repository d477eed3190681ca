//! Station directory.
//!
//! Provides code → station lookup and free-text search over the NS station
//! catalog, fetched once per process and shared by every subscription.

mod directory;

pub use directory::{DEFAULT_STATION_CODE, StationDirectory};
