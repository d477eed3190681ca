//! Virtual-train (live position) projection.

use serde_json::Value;

use crate::domain::Vehicle;

use super::departure::DEFAULT_CATEGORY_CODE;
use super::error::NormalizeError;
use super::fields::Fields;

/// Project one vehicle entry into a [`Vehicle`].
///
/// Journey id, train number and position are required. Speed and heading
/// default to zero.
pub fn vehicle(value: &Value) -> Result<Vehicle, NormalizeError> {
    let fields = Fields::of(value, "vehicle")?;

    let journey_id = fields.require_string("ritId")?;
    let service_number = fields.require_int("treinNummer")?;
    let latitude = fields.require_float("lat")?;
    let longitude = fields.require_float("lng")?;

    Ok(Vehicle {
        composite_id: Vehicle::composite_id_for(service_number, &journey_id),
        journey_id,
        service_number,
        latitude,
        longitude,
        speed_kmh: fields.float("snelheid").unwrap_or(0.0),
        heading_degrees: fields.float("richting").unwrap_or(0.0),
        category_code: fields
            .string("type")
            .unwrap_or_else(|| DEFAULT_CATEGORY_CODE.to_string()),
        position_accuracy: fields.float("horizontaleNauwkeurigheid"),
    })
}
