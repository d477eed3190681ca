//! Timestamp parsing and delay arithmetic.

use chrono::{DateTime, FixedOffset};

/// Formats tried after RFC 3339. NS sends offsets without a colon
/// (`2025-03-01T10:15:00+0100`), which RFC 3339 parsing rejects.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parse an ISO-8601 timestamp with a timezone offset.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    })
}

/// Whole minutes between the scheduled and actual time, rounded to nearest.
///
/// Returns 0 when the actual time is absent or cannot be parsed. That makes
/// "unknown" indistinguishable from "on time", which is what the boards
/// show.
pub fn delay_minutes(scheduled: &DateTime<FixedOffset>, actual: Option<&str>) -> i64 {
    let Some(actual) = actual.and_then(parse_timestamp) else {
        return 0;
    };
    let seconds = actual.signed_duration_since(*scheduled).num_seconds();
    (seconds as f64 / 60.0).round() as i64
}
