//! Departure and arrival board projection.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::domain::Departure;

use super::error::NormalizeError;
use super::fields::{Fields, as_string};
use super::time::{delay_minutes, parse_timestamp};

pub const DEFAULT_OPERATOR: &str = "NS";
pub const DEFAULT_CATEGORY_NAME: &str = "Intercity";
pub const DEFAULT_CATEGORY_CODE: &str = "IC";

/// Whether the platform has changed from the planned one.
///
/// An empty actual platform means "not yet known", not "changed".
pub fn platform_changed(actual: &str, planned: &str) -> bool {
    !actual.is_empty() && actual != planned
}

/// Join the intermediate stops of a route, skipping origin and destination.
///
/// Unnamed stops are left out.
pub fn via_summary<S: AsRef<str>>(route: &[S]) -> String {
    if route.len() <= 2 {
        return String::new();
    }
    route[1..route.len() - 1]
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Project one board entry into a [`Departure`].
///
/// `plannedDateTime` is the only required field. A planned time that is
/// present but unparsable is replaced by the current time with no delay, so
/// the service stays on the board. Arrivals name the far end of the journey
/// `origin` rather than `direction`; either is accepted.
pub fn departure(value: &Value) -> Result<Departure, NormalizeError> {
    let fields = Fields::of(value, "departure")?;

    let planned = fields.require_string("plannedDateTime")?;
    let (scheduled_time, delay) = match parse_timestamp(&planned) {
        Some(scheduled) => {
            let actual = fields.string("actualDateTime");
            (scheduled, delay_minutes(&scheduled, actual.as_deref()))
        }
        None => {
            warn!(value = %planned, "unparsable plannedDateTime, using current time");
            (Utc::now().fixed_offset(), 0)
        }
    };

    let platform_actual = fields.string("actualTrack").unwrap_or_default();
    let platform_planned = fields.string("plannedTrack").unwrap_or_default();

    let product = fields.object("product");
    let product_field = |key: &str, default: &str| {
        product
            .and_then(|p| p.string(key))
            .unwrap_or_else(|| default.to_string())
    };

    let route = fields.array("routeStations");
    let destination_codes = route
        .iter()
        .filter_map(Fields::try_of)
        .filter_map(|stop| stop.string("uicCode"))
        .collect();
    let route_names: Vec<String> = route
        .iter()
        .map(|stop| {
            Fields::try_of(stop)
                .and_then(|s| s.string("mediumName"))
                .unwrap_or_default()
        })
        .collect();

    let remarks = fields
        .array("messages")
        .iter()
        .filter_map(|m| match m {
            Value::Object(_) => Fields::try_of(m)
                .and_then(|f| f.get("message"))
                .and_then(as_string),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();

    Ok(Departure {
        id: Uuid::new_v4(),
        scheduled_time,
        cancelled: fields.bool("cancelled").unwrap_or(false),
        delay_minutes: delay,
        destination_name: fields
            .string("direction")
            .or_else(|| fields.string("origin"))
            .unwrap_or_default(),
        destination_codes,
        via_summary: via_summary(&route_names),
        operator_name: product_field("operatorName", DEFAULT_OPERATOR),
        service_number: product_field("number", ""),
        train_category_name: product_field("longCategoryName", DEFAULT_CATEGORY_NAME),
        train_category_code: product_field("categoryCode", DEFAULT_CATEGORY_CODE),
        platform_changed: platform_changed(&platform_actual, &platform_planned),
        platform_actual,
        platform_planned,
        remarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn full_departure() -> Value {
        json!({
            "direction": "Den Haag Centraal",
            "name": "NS  2241",
            "plannedDateTime": "2025-03-01T10:15:00+0100",
            "actualDateTime": "2025-03-01T10:18:00+0100",
            "plannedTrack": "5",
            "actualTrack": "5a",
            "product": {
                "number": "2241",
                "categoryCode": "IC",
                "shortCategoryName": "NS Intercity",
                "longCategoryName": "Intercity",
                "operatorCode": "NS",
                "operatorName": "NS"
            },
            "trainCategory": "IC",
            "cancelled": false,
            "routeStations": [
                {"uicCode": "8400058", "mediumName": "Amsterdam C."},
                {"uicCode": "8400561", "mediumName": "Schiphol Airport"},
                {"uicCode": "8400390", "mediumName": "Leiden C."},
                {"uicCode": "8400280", "mediumName": "Den Haag C."}
            ],
            "messages": [
                {"message": "Let op, afwijkende vertrektijd", "style": "WARNING"}
            ],
            "departureStatus": "INCOMING"
        })
    }

    #[test]
    fn full_record() {
        let d = departure(&full_departure()).unwrap();

        assert_eq!(d.destination_name, "Den Haag Centraal");
        assert_eq!(d.delay_minutes, 3);
        assert!(!d.cancelled);
        assert_eq!(d.platform_actual, "5a");
        assert_eq!(d.platform_planned, "5");
        assert!(d.platform_changed);
        assert_eq!(d.service_number, "2241");
        assert_eq!(d.operator_name, "NS");
        assert_eq!(d.train_category_name, "Intercity");
        assert_eq!(d.train_category_code, "IC");
        assert_eq!(
            d.destination_codes,
            vec!["8400058", "8400561", "8400390", "8400280"]
        );
        assert_eq!(d.via_summary, "Schiphol Airport, Leiden C.");
        assert_eq!(d.remarks, vec!["Let op, afwijkende vertrektijd"]);
    }

    #[test]
    fn ids_are_unique_per_decode() {
        let a = departure(&full_departure()).unwrap();
        let b = departure(&full_departure()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn minimal_record_uses_defaults() {
        let value = json!({"plannedDateTime": "2025-03-01T10:15:00+0100"});
        let d = departure(&value).unwrap();

        assert_eq!(d.delay_minutes, 0);
        assert!(!d.cancelled);
        assert_eq!(d.destination_name, "");
        assert!(d.destination_codes.is_empty());
        assert_eq!(d.via_summary, "");
        assert_eq!(d.operator_name, "NS");
        assert_eq!(d.service_number, "");
        assert_eq!(d.train_category_name, "Intercity");
        assert_eq!(d.train_category_code, "IC");
        assert_eq!(d.platform_actual, "");
        assert_eq!(d.platform_planned, "");
        assert!(!d.platform_changed);
        assert!(d.remarks.is_empty());
    }

    #[test]
    fn partial_product_fills_missing_fields() {
        let value = json!({
            "plannedDateTime": "2025-03-01T10:15:00+0100",
            "product": {"number": 5641, "longCategoryName": "Sprinter", "categoryCode": null}
        });
        let d = departure(&value).unwrap();
        assert_eq!(d.service_number, "5641");
        assert_eq!(d.train_category_name, "Sprinter");
        assert_eq!(d.train_category_code, "IC");
        assert_eq!(d.operator_name, "NS");
    }

    #[test]
    fn arrival_origin_is_accepted() {
        let value = json!({
            "origin": "Maastricht",
            "plannedDateTime": "2025-03-01T10:15:00+0100",
            "actualDateTime": "2025-03-01T10:25:00+0100"
        });
        let d = departure(&value).unwrap();
        assert_eq!(d.destination_name, "Maastricht");
        assert_eq!(d.delay_minutes, 10);
    }

    #[test]
    fn unparsable_actual_means_no_delay() {
        let value = json!({
            "plannedDateTime": "2025-03-01T10:15:00+0100",
            "actualDateTime": "later"
        });
        assert_eq!(departure(&value).unwrap().delay_minutes, 0);
    }

    #[test]
    fn missing_planned_time_is_an_error() {
        let value = json!({"direction": "Zwolle"});
        assert_eq!(
            departure(&value).unwrap_err(),
            NormalizeError::MissingField("plannedDateTime")
        );
    }

    #[test]
    fn unparsable_planned_time_falls_back_to_now() {
        let value = json!({
            "plannedDateTime": "2025-03-01 10:15",
            "actualDateTime": "2025-03-01T10:25:00+0100",
            "direction": "Zwolle"
        });
        let before = Utc::now();
        let d = departure(&value).unwrap();
        let after = Utc::now();

        assert_eq!(d.destination_name, "Zwolle");
        assert_eq!(d.delay_minutes, 0);
        let scheduled = d.scheduled_time.with_timezone(&Utc);
        assert!(scheduled >= before && scheduled <= after);
    }

    #[test]
    fn malformed_messages_are_skipped() {
        let value = json!({
            "plannedDateTime": "2025-03-01T10:15:00+0100",
            "messages": [{"message": "Rijdt niet"}, {"style": "INFO"}, 12, "Extra trein"]
        });
        assert_eq!(departure(&value).unwrap().remarks, vec!["Rijdt niet", "Extra trein"]);
    }

    #[test]
    fn cancelled_as_string() {
        let value = json!({"plannedDateTime": "2025-03-01T10:15:00+0100", "cancelled": "true"});
        assert!(departure(&value).unwrap().cancelled);
    }

    #[test]
    fn platform_change_examples() {
        assert!(platform_changed("5a", "5"));
        assert!(!platform_changed("", "5"));
        assert!(!platform_changed("5", "5"));
        assert!(platform_changed("7", ""));
    }

    #[test]
    fn via_summary_examples() {
        assert_eq!(via_summary(&["A", "B", "C", "D"]), "B, C");
        assert_eq!(via_summary(&["A", "B"]), "");
        assert_eq!(via_summary(&["A"]), "");
        assert_eq!(via_summary::<&str>(&[]), "");
        assert_eq!(via_summary(&["A", "", "C", "D"]), "C");
    }

    proptest! {
        #[test]
        fn platform_changed_definition(actual in "[0-9a-c]{0,3}", planned in "[0-9a-c]{0,3}") {
            prop_assert_eq!(
                platform_changed(&actual, &planned),
                actual != planned && !actual.is_empty()
            );
        }

        #[test]
        fn via_summary_excludes_endpoints(route in prop::collection::vec("[A-Z][a-z]{1,6}", 0..8)) {
            let summary = via_summary(&route);
            if route.len() <= 2 {
                prop_assert_eq!(summary, "");
            } else {
                prop_assert_eq!(summary, route[1..route.len() - 1].join(", "));
            }
        }
    }
}
