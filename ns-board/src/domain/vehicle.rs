//! Live vehicle positions.

use serde::Serialize;

/// A train position reported by the virtual-train feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// `"{service_number}-{journey_id}"`, unique within one response.
    pub composite_id: String,
    pub journey_id: String,
    pub service_number: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub heading_degrees: f64,
    pub category_code: String,
    /// Horizontal accuracy of the fix in meters, if reported.
    pub position_accuracy: Option<f64>,
}

impl Vehicle {
    /// Build the composite identifier for a service on a journey.
    pub fn composite_id_for(service_number: i64, journey_id: &str) -> String {
        format!("{service_number}-{journey_id}")
    }

    /// Whether the train is standing still.
    pub fn is_stationary(&self) -> bool {
        self.speed_kmh < 1.0
    }
}
