//! Station record.

use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::StationCode;

/// Latitude used when the catalog omits a station's position.
///
/// Together with [`FALLBACK_LONGITUDE`] this is roughly the centre of the
/// Netherlands.
pub const FALLBACK_LATITUDE: f64 = 52.2;

/// Longitude used when the catalog omits a station's position.
pub const FALLBACK_LONGITUDE: f64 = 5.5;

/// A station from the NS station catalog.
///
/// Identity is the station code: two `Station`s with the same code compare
/// equal regardless of the other fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub code: StationCode,
    pub display_name: String,
    /// ISO country code as reported upstream (`NL`, `D`, `B`, ...).
    pub country_code: String,
    /// UIC code, when the catalog provides one.
    pub union_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Station {
    /// Whether the station is in the given country.
    pub fn is_in(&self, country_code: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(country_code)
    }

    /// Whether the station matches a free-text search (name or code).
    ///
    /// Matching is a case-insensitive substring test. An empty query matches
    /// everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.display_name.to_lowercase().contains(&query)
            || self.code.as_str().to_lowercase().contains(&query)
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Station {}

impl Hash for Station {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}
