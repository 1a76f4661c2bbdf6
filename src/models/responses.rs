//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, RemoteStatus};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
    /// Effective TTL in seconds
    pub ttl: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            ttl,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for pattern deletion (DELETE /keys)
#[derive(Debug, Clone, Serialize)]
pub struct DeletePatternResponse {
    pub pattern: String,
    /// Entries removed across both tiers
    pub deleted: usize,
}

impl DeletePatternResponse {
    pub fn new(pattern: impl Into<String>, deleted: usize) -> Self {
        Self {
            pattern: pattern.into(),
            deleted,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub remote_hits: u64,
    pub fallback_hits: u64,
    pub fallback_writes: u64,
    pub remote_errors: u64,
    pub decode_errors: u64,
    pub evictions: u64,
    pub fallback_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub remote_status: RemoteStatus,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            remote_hits: stats.remote_hits,
            fallback_hits: stats.fallback_hits,
            fallback_writes: stats.fallback_writes,
            remote_errors: stats.remote_errors,
            decode_errors: stats.decode_errors,
            evictions: stats.evictions,
            fallback_entries: stats.fallback_entries,
            remote_status: stats.remote_status,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" while serving from the fallback only
    pub status: String,
    pub remote: RemoteStatus,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(remote: RemoteStatus) -> Self {
        let status = match remote {
            RemoteStatus::Failed => "degraded",
            _ => "healthy",
        };
        Self {
            status: status.to_string(),
            remote,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
