//! NS API access.
//!
//! This module provides an HTTP client for the NS travel-information API
//! (stations, departures, arrivals) and the virtual-train API (live vehicle
//! positions), plus a mock for tests.
//!
//! Key characteristics of the NS API:
//! - Every request needs an `Ocp-Apim-Subscription-Key` header
//! - Responses are wrapped in a `payload` envelope
//! - Field types drift between endpoints, so bodies are decoded through
//!   [`crate::normalize`] rather than fixed structs

mod api;
mod client;
mod error;
mod mock;

pub use api::{
    DEFAULT_MAX_JOURNEYS, DEFAULT_RADIUS_KM, DEFAULT_VEHICLE_LIMIT, TransitApi, VehicleQuery,
};
pub use client::{TransitClient, TransitConfig};
pub use error::TransitError;
pub use mock::{Endpoint, MockTransitClient};
