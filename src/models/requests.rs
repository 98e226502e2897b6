//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the SET operation (POST /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds; missing or 0 means no expiry
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl SetRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() || self.value.is_empty() {
            return Some("Missing key or value".to_string());
        }
        if matches!(self.ttl, Some(ttl) if ttl < 0) {
            return Some("Invalid TTL (must be a non-negative integer in seconds)".to_string());
        }
        None
    }

    /// TTL in seconds for the store; 0 means no expiry.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.unwrap_or(0).max(0) as u64
    }
}

/// Request body for the DEL operation (POST /del)
#[derive(Debug, Clone, Deserialize)]
pub struct DelRequest {
    /// The key to delete
    pub key: String,
}

impl DelRequest {
    /// Validates the request data.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Missing key".to_string());
        }
        None
    }
}
