//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{MAX_KEY_LENGTH, MAX_TTL_SECS};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: Logical cache key (the namespace prefix is added by the cache)
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses the configured default if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = validate_key(&self.key) {
            return Some(msg);
        }
        match self.ttl {
            Some(0) => Some("TTL must be at least 1 second".to_string()),
            Some(ttl) if ttl > MAX_TTL_SECS => Some(format!(
                "TTL exceeds maximum of {} seconds",
                MAX_TTL_SECS
            )),
            _ => None,
        }
    }
}

/// Query string for pattern deletion (DELETE /keys?pattern=...)
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePatternQuery {
    /// Glob relative to the namespace, e.g. `categories:tenantA*`
    pub pattern: String,
}

impl DeletePatternQuery {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Pattern exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}
