//! Departure and arrival records.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

/// A single service on a departure or arrival board.
///
/// Arrivals reuse this shape. For an arrival, `destination_name` holds the
/// service's origin; relabelling it is up to whoever displays it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// Opaque token, unique per decoded record. Not stable across fetches.
    pub id: Uuid,
    pub scheduled_time: DateTime<FixedOffset>,
    pub cancelled: bool,
    /// Minutes late (negative when running early). Zero when no actual time
    /// is known.
    pub delay_minutes: i64,
    pub destination_name: String,
    /// UIC codes of the stations on the route, in running order.
    pub destination_codes: Vec<String>,
    /// Intermediate stops joined with `", "`, excluding origin and
    /// destination.
    pub via_summary: String,
    pub operator_name: String,
    pub service_number: String,
    pub train_category_name: String,
    pub train_category_code: String,
    pub platform_actual: String,
    pub platform_planned: String,
    pub platform_changed: bool,
    pub remarks: Vec<String>,
}

impl Departure {
    /// Best known time for the service: scheduled time plus delay.
    pub fn expected_time(&self) -> DateTime<FixedOffset> {
        self.scheduled_time + chrono::Duration::minutes(self.delay_minutes)
    }

    /// Whether the service is running late.
    pub fn is_delayed(&self) -> bool {
        self.delay_minutes > 0
    }

    /// The platform to show: actual if known, planned otherwise.
    pub fn platform(&self) -> &str {
        if self.platform_actual.is_empty() {
            &self.platform_planned
        } else {
            &self.platform_actual
        }
    }
}
