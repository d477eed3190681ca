//! Transit client error types.

use std::sync::Arc;

use crate::config::ConfigError;
use crate::normalize::NormalizeError;

/// Errors from the NS API client.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// The client could not be configured (bad credential)
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Request parameters were rejected before sending
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API returned a non-2xx status code
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response could not be decoded into domain records
    #[error("failed to decode response: {cause}")]
    Decode {
        #[source]
        cause: NormalizeError,
    },

    /// Transport failure (connect, timeout, read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure of a fetch that was shared with other callers
    #[error(transparent)]
    Shared(Arc<TransitError>),
}

impl TransitError {
    /// Whether a later attempt could succeed without changing anything.
    ///
    /// Configuration and request errors are programmer or operator errors and
    /// will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransitError::Configuration(_) | TransitError::InvalidRequest(_) => false,
            TransitError::HttpStatus { .. }
            | TransitError::Decode { .. }
            | TransitError::Network(_) => true,
            TransitError::Shared(inner) => inner.is_retryable(),
        }
    }

    /// HTTP status, if the API answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransitError::HttpStatus { status, .. } => Some(*status),
            TransitError::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    /// Take ownership of a shared error when this was the only holder.
    pub(crate) fn from_shared(shared: Arc<TransitError>) -> Self {
        Arc::try_unwrap(shared).unwrap_or_else(TransitError::Shared)
    }
}

impl From<NormalizeError> for TransitError {
    fn from(cause: NormalizeError) -> Self {
        TransitError::Decode { cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransitError::HttpStatus {
            status: 503,
            body: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Service Unavailable");

        let err = TransitError::InvalidRequest("limit must be positive".into());
        assert_eq!(err.to_string(), "invalid request: limit must be positive");

        let err: TransitError = NormalizeError::MissingField("payload").into();
        assert_eq!(
            err.to_string(),
            "failed to decode response: missing required field: payload"
        );

        let err: TransitError = ConfigError::MissingApiKey.into();
        assert!(err.to_string().starts_with("configuration error: NS_API_KEY"));
    }

    #[test]
    fn retry_classification() {
        assert!(
            TransitError::HttpStatus {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(TransitError::from(NormalizeError::MissingField("payload")).is_retryable());
        assert!(!TransitError::InvalidRequest("x".into()).is_retryable());
        assert!(!TransitError::from(ConfigError::InvalidApiKey).is_retryable());
    }

    #[test]
    fn shared_errors_delegate() {
        let inner = Arc::new(TransitError::HttpStatus {
            status: 429,
            body: String::new(),
        });
        let shared = TransitError::Shared(Arc::clone(&inner));
        assert_eq!(shared.status(), Some(429));
        assert!(shared.is_retryable());
        assert_eq!(shared.to_string(), "HTTP error 429: ");
    }

    #[test]
    fn from_shared_unwraps_sole_owner() {
        let sole = Arc::new(TransitError::InvalidRequest("x".into()));
        assert!(matches!(
            TransitError::from_shared(sole),
            TransitError::InvalidRequest(_)
        ));

        let held = Arc::new(TransitError::InvalidRequest("x".into()));
        let _other = Arc::clone(&held);
        assert!(matches!(
            TransitError::from_shared(held),
            TransitError::Shared(_)
        ));
    }
}
