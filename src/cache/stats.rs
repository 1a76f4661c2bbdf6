//! Cache Statistics Module
//!
//! Counters for hits, misses, fallback usage and remote failures.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Metrics ==
/// Lock-free counters updated by the facade.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    remote_hits: AtomicU64,
    fallback_hits: AtomicU64,
    misses: AtomicU64,
    fallback_writes: AtomicU64,
    remote_errors: AtomicU64,
    decode_errors: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_remote_hit(&self) {
        self.remote_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A write that landed in the fallback because the remote store refused it.
    pub fn record_fallback_write(&self) {
        self.fallback_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Captures the counters together with fallback and remote state.
    pub fn snapshot(
        &self,
        evictions: u64,
        fallback_entries: usize,
        remote_status: RemoteStatus,
    ) -> CacheStats {
        let remote_hits = self.remote_hits.load(Ordering::Relaxed);
        let fallback_hits = self.fallback_hits.load(Ordering::Relaxed);
        CacheStats {
            hits: remote_hits + fallback_hits,
            misses: self.misses.load(Ordering::Relaxed),
            remote_hits,
            fallback_hits,
            fallback_writes: self.fallback_writes.load(Ordering::Relaxed),
            remote_errors: self.remote_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            evictions,
            fallback_entries,
            remote_status,
        }
    }
}

// == Remote Status ==
/// Health of the primary tier as seen by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    /// No remote store configured; the fallback is the only tier
    Disabled,
    /// Never connected yet
    Uninitialized,
    Connecting,
    Ready,
    /// Last connect failed or a live connection was lost
    Failed,
}

// == Cache Stats ==
/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Hits from either tier
    pub hits: u64,
    /// Lookups that found nothing in either tier
    pub misses: u64,
    pub remote_hits: u64,
    pub fallback_hits: u64,
    pub fallback_writes: u64,
    pub remote_errors: u64,
    /// Cached payloads that failed to deserialize and were treated as misses
    pub decode_errors: u64,
    /// Fallback entries evicted for capacity
    pub evictions: u64,
    pub fallback_entries: usize,
    pub remote_status: RemoteStatus,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
