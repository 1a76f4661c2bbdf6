//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::TieredCache;
use crate::error::{CacheError, Result};
use crate::models::{
    DeletePatternQuery, DeletePatternResponse, DeleteResponse, GetResponse, HealthResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache is internally shared, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub cache: TieredCache,
    /// TTL in seconds for writes that do not specify one
    pub default_ttl: u64,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: TieredCache, default_ttl: u64) -> Self {
        Self { cache, default_ttl }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(TieredCache::from_config(config), config.default_ttl)
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or(state.default_ttl);
    state
        .cache
        .set(&req.key, &req.value, Duration::from_secs(ttl))
        .await;

    Ok(Json(SetResponse::new(req.key, ttl)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from whichever tier holds it.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value: Value = state
        .cache
        .get(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.delete(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /keys?pattern=...
///
/// Invalidates every key matching a glob pattern in both tiers.
pub async fn delete_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<DeletePatternQuery>,
) -> Result<Json<DeletePatternResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let deleted = state.cache.delete_pattern(&query.pattern).await;
    Ok(Json(DeletePatternResponse::new(query.pattern, deleted)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
///
/// Reports `degraded` while Redis is configured but unreachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.cache.remote_status()))
}
