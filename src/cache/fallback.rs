//! Fallback Store Module
//!
//! Bounded in-process map used when the remote store is unavailable.
//! Expiry is lazy: entries are dropped when a `get` finds them expired or
//! when an over-capacity insert triggers a cleanup pass.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::{current_timestamp_ms, FallbackEntry};
use crate::cache::pattern::glob_match;

// == Fallback Store ==
/// TTL-respecting map with soonest-expiry eviction.
#[derive(Debug)]
pub struct FallbackStore {
    entries: HashMap<String, FallbackEntry>,
    max_entries: usize,
    evictions: u64,
}

impl FallbackStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            evictions: 0,
        }
    }

    // == Set ==
    /// Stores a serialized value that expires `ttl` from now.
    ///
    /// Overwriting an existing key replaces both value and expiry.
    pub fn set(&mut self, key: String, value: String, ttl: Duration) {
        self.insert(key, FallbackEntry::new(value, ttl));
    }

    /// Stores a prepared entry, then enforces the capacity bound.
    pub fn insert(&mut self, key: String, entry: FallbackEntry) {
        self.entries.insert(key, entry);
        if self.entries.len() > self.max_entries {
            self.enforce_capacity();
        }
    }

    // == Get ==
    /// Returns the serialized value if present and fresh.
    ///
    /// A found-but-expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes an entry. Returns whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Delete Matching ==
    /// Removes every entry whose key matches the glob `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn delete_matching(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !glob_match(pattern, key));
        before - self.entries.len()
    }

    // == Capacity ==
    /// Purges expired entries, then evicts soonest-expiring ones until the
    /// map is back within its bound.
    fn enforce_capacity(&mut self) {
        let now = current_timestamp_ms();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let overflow = self.entries.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            return;
        }

        let mut by_expiry: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.expires_at, key.clone()))
            .collect();
        by_expiry.sort_unstable();

        for (_, key) in by_expiry.into_iter().take(overflow) {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }

    /// Number of entries evicted for capacity since creation.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is currently held, regardless of expiry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
