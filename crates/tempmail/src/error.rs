//! Error types for mailbox operations

use crate::api::ApiMethod;

/// Failure reported by a [`Transport`](crate::api::Transport)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("response body is not valid JSON: {0}")]
    Body(String),
}

/// Error returned by API calls
///
/// Errors are `Clone` so that the same value can be returned to the
/// caller and carried on an [`Event`](crate::events::Event).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{method} request failed: {source}")]
    Transport {
        method: ApiMethod,
        #[source]
        source: TransportError,
    },

    #[error("unexpected {method} response: {message}")]
    Decode { method: ApiMethod, message: String },
}

impl ApiError {
    /// The API method whose call failed
    pub fn method(&self) -> ApiMethod {
        match self {
            ApiError::Transport { method, .. } | ApiError::Decode { method, .. } => *method,
        }
    }
}

/// Result type alias for mailbox operations
pub type Result<T> = std::result::Result<T, ApiError>;
