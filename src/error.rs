//! Error types for the cache service
//!
//! Backend failures are recovered inside the facade; these variants only
//! reach callers through the admin HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote store unreachable or connect retries exhausted
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Individual remote command failed
    #[error("Command failed: {0}")]
    Command(String),

    /// Remote command exceeded its timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Value could not be encoded or a cached payload could not be decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Key not found in either tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Whether this error means the remote connection should be considered lost.
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout(err.to_string())
        } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Connection(_) | CacheError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Command(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_loss_classification() {
        assert!(CacheError::Connection("refused".into()).is_connection_loss());
        assert!(CacheError::Timeout("GET".into()).is_connection_loss());
        assert!(!CacheError::Command("WRONGTYPE".into()).is_connection_loss());
        assert!(!CacheError::Serialization("eof".into()).is_connection_loss());
    }

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        assert!(matches!(CacheError::from(err), CacheError::Serialization(_)));
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("key".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::Serialization("eof".into()), StatusCode::BAD_REQUEST),
            (CacheError::Connection("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Timeout("GET".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Command("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.into_response().status(), expected_status);
        }
    }
}
