//! Station catalog projection.

use serde_json::Value;

use crate::domain::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE, Station, StationCode};

use super::error::NormalizeError;
use super::fields::Fields;

/// Name variants in order of preference. `namen` holds long, medium and
/// short names; boards want the long one.
const NAME_KEYS: &[&str] = &["lang", "middel", "kort"];

/// Project one catalog entry into a [`Station`].
///
/// Only `code` is required. Missing coordinates fall back to the national
/// centroid.
pub fn station(value: &Value) -> Result<Station, NormalizeError> {
    let fields = Fields::of(value, "station")?;

    let code = StationCode::parse(&fields.require_string("code")?)?;

    let display_name = fields
        .object("namen")
        .and_then(|names| NAME_KEYS.iter().find_map(|key| names.string(key)))
        .unwrap_or_default();

    Ok(Station {
        code,
        display_name,
        country_code: fields.string("land").unwrap_or_default(),
        union_code: fields.string("UICCode"),
        latitude: fields.float("lat").unwrap_or(FALLBACK_LATITUDE),
        longitude: fields.float("lng").unwrap_or(FALLBACK_LONGITUDE),
    })
}
