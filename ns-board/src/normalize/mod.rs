//! Projection of raw NS API responses into domain records.
//!
//! The upstream schema is loosely typed and fields come and go, so payloads
//! are read as [`serde_json::Value`] and projected field by field rather than
//! deserialized into fixed structs. Everything here is pure: no I/O, no
//! clocks apart from generating record ids.
//!
//! Envelope functions (`*_payload`) fail when the envelope itself is
//! missing. Individual records that fail to project are logged and skipped
//! so one malformed service does not take down a whole board.

mod departure;
mod error;
mod fields;
mod station;
mod time;
mod vehicle;

use serde_json::Value;
use tracing::warn;

use crate::domain::{Departure, Station, Vehicle};

pub use departure::{
    DEFAULT_CATEGORY_CODE, DEFAULT_CATEGORY_NAME, DEFAULT_OPERATOR, departure, platform_changed,
    via_summary,
};
pub use error::NormalizeError;
pub use fields::{Fields, as_bool, as_float, as_int, as_string};
pub use station::station;
pub use time::{delay_minutes, parse_timestamp};
pub use vehicle::vehicle;

/// Parse a response body into a JSON value.
pub fn parse_body(body: &str) -> Result<Value, NormalizeError> {
    Ok(serde_json::from_str(body)?)
}

/// `{ payload: Station[] }`
pub fn stations_payload(root: &Value) -> Result<Vec<Station>, NormalizeError> {
    let root = Fields::of(root, "stations response")?;
    let items = root.require_array("payload")?;
    Ok(project_all(items, "station", station))
}

/// `{ payload: { departures: [...] } }`
pub fn departures_payload(root: &Value) -> Result<Vec<Departure>, NormalizeError> {
    let items = payload(root, "departures response")?.require_array("departures")?;
    Ok(project_all(items, "departure", departure))
}

/// `{ payload: { arrivals: [...] } }`
pub fn arrivals_payload(root: &Value) -> Result<Vec<Departure>, NormalizeError> {
    let items = payload(root, "arrivals response")?.require_array("arrivals")?;
    Ok(project_all(items, "arrival", departure))
}

/// `{ payload: { vehicles: [...] } }`, or the older `treinen` key.
pub fn vehicles_payload(root: &Value) -> Result<Vec<Vehicle>, NormalizeError> {
    let payload = payload(root, "vehicles response")?;
    let items = if payload.get("vehicles").is_some() {
        payload.require_array("vehicles")?
    } else {
        payload.require_array("treinen")?
    };
    Ok(project_all(items, "vehicle", vehicle))
}

fn payload<'a>(root: &'a Value, what: &'static str) -> Result<Fields<'a>, NormalizeError> {
    let root = Fields::of(root, what)?;
    let payload = root
        .get("payload")
        .ok_or(NormalizeError::MissingField("payload"))?;
    Fields::of(payload, "payload")
}

/// Project every element, skipping and logging the ones that fail.
fn project_all<T>(
    items: &[Value],
    kind: &'static str,
    project: fn(&Value) -> Result<T, NormalizeError>,
) -> Vec<T> {
    let mut results = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match project(item) {
            Ok(record) => results.push(record),
            Err(e) => warn!(kind, index, error = %e, "skipping malformed record"),
        }
    }

    results
}
