//! API Handlers
//!
//! HTTP request handlers: thin adapters from decoded requests to cache
//! facade calls. Every handler that touches the cache takes the write half
//! of the lock, GET included, because a read can expire an entry and always
//! updates recency.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::models::{DelRequest, SetRequest, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
}

impl AppState {
    /// Creates a new AppState wrapping an opened cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }
}

/// Query parameters for GET /get
#[derive(Debug, Deserialize)]
pub struct GetParams {
    /// The key to look up; an absent parameter behaves like an unknown key
    #[serde(default)]
    pub key: String,
}

/// Handler for GET /
///
/// Health check; responds with a plain status line.
pub async fn health_handler() -> &'static str {
    "duracache server running"
}

/// Handler for POST /set
///
/// Stores a key-value pair with optional TTL (seconds; missing or 0 means no
/// expiry).
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<String> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidInput(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(&req.key, &req.value, req.ttl_seconds())?;

    Ok("OK key set".to_string())
}

/// Handler for GET /get?key=<k>
///
/// Returns the raw value, or 404 if the key is absent or expired.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(params): Query<GetParams>,
) -> Result<String> {
    let mut cache = state.cache.write().await;
    cache.get(&params.key)
}

/// Handler for POST /del
///
/// Deletes a key; deleting an absent key succeeds.
pub async fn del_handler(
    State(state): State<AppState>,
    Json(req): Json<DelRequest>,
) -> Result<String> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidInput(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.del(&req.key)?;

    Ok("OK Key Deleted".to_string())
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::new(&cache.stats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn test_state() -> (TempDir, AppState) {
        let dir = tempdir().unwrap();
        let store = CacheStore::open(
            &dir.path().join("appendonly.aof"),
            &dir.path().join("dump.rdb"),
            0,
        )
        .unwrap();
        (dir, AppState::new(store))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (_dir, state) = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert_eq!(result.unwrap(), "OK key set");

        let result = get_handler(
            State(state),
            Query(GetParams {
                key: "test_key".to_string(),
            }),
        )
        .await;
        assert_eq!(result.unwrap(), "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let (_dir, state) = test_state();

        let result = get_handler(
            State(state),
            Query(GetParams {
                key: "nonexistent".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_key_param() {
        let (_dir, state) = test_state();

        let result = get_handler(State(state), Query(GetParams { key: String::new() })).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_del_handler() {
        let (_dir, state) = test_state();

        let req = SetRequest {
            key: "to_delete".to_string(),
            value: "value".to_string(),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let req = DelRequest {
            key: "to_delete".to_string(),
        };
        let result = del_handler(State(state.clone()), Json(req)).await;
        assert_eq!(result.unwrap(), "OK Key Deleted");

        let result = get_handler(
            State(state),
            Query(GetParams {
                key: "to_delete".to_string(),
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_del_absent_key_succeeds() {
        let (_dir, state) = test_state();

        let req = DelRequest {
            key: "never_existed".to_string(),
        };
        let result = del_handler(State(state), Json(req)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (_dir, state) = test_state();

        let req = SetRequest {
            key: "".to_string(),
            value: "value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidInput(_))));

        let req = SetRequest {
            key: "key".to_string(),
            value: "value".to_string(),
            ttl: Some(-1),
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (_dir, state) = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert!(response.contains("running"));
    }
}
