//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache server.
///
/// Steady-state persistence failures (AOF write/sync errors) are logged and
/// swallowed inside the facade rather than surfaced here; only startup
/// failures propagate as `Persistence`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (absent or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data (empty key/value, negative TTL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence failure during startup (cannot open or create the AOF)
    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Internal invariant violation; should not occur
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CacheError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::Persistence(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
