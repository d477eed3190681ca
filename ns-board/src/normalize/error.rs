//! Normalizer error types.

use crate::domain::InvalidStationCode;

/// Failure to project an upstream payload into a domain record.
///
/// Only raised for required data. Optional fields that are missing or
/// malformed fall back to defaults instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// The response body was not JSON at all
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Expected a JSON object
    #[error("expected an object for {0}")]
    NotAnObject(&'static str),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A required field is present but has an unusable type
    #[error("field {field} has the wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// The station code is not usable
    #[error(transparent)]
    InvalidStationCode(#[from] InvalidStationCode),
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        NormalizeError::Json {
            message: err.to_string(),
        }
    }
}
