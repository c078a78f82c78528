//! Error types for configuration and the feature protocol.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Raised before anything reaches the network.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field was present but unusable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Feature protocol errors: anything that goes wrong while reading from
/// or committing to a feature service.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The server reported an OGC service exception.
    #[error("service exception: {0}")]
    ServiceException(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be encoded (filter, transaction body, ...).
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProtocolError {
    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProtocolError::Network(_) | ProtocolError::Timeout(_) => true,
            ProtocolError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
