//! Fallback Entry Module
//!
//! Defines the entries held by the in-process fallback map.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Fallback Entry ==
/// A serialized value plus its absolute expiry.
#[derive(Debug, Clone)]
pub struct FallbackEntry {
    /// JSON-encoded value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl FallbackEntry {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self::with_expiry(value, expiry_from_now(ttl))
    }

    /// Creates an entry with an already computed expiry.
    pub fn with_expiry(value: String, expires_at: u64) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time,
    /// so it is never returned after the TTL has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Absolute expiry in Unix milliseconds for a TTL starting now.
///
/// TTLs too large to represent saturate to "never expires".
pub fn expiry_from_now(ttl: Duration) -> u64 {
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    current_timestamp_ms().saturating_add(ttl_ms)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = FallbackEntry::new("\"value\"".to_string(), Duration::from_secs(60));

        assert_eq!(entry.value, "\"value\"");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = FallbackEntry::new("1".to_string(), Duration::from_millis(50));

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        // 2^61 s is 2^61 * 1000 ms, which wraps to 0 when cast to u64
        let entry = FallbackEntry::new("7".to_string(), Duration::from_secs(1 << 61));

        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired());
        assert_eq!(expiry_from_now(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = FallbackEntry::with_expiry("1".to_string(), now);

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }
}
