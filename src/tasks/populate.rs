//! Cache Population Task
//!
//! Fire-and-forget write-back used by `TieredCache::get_or_set`.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::TieredCache;

/// Spawns a detached task that stores an already serialized value.
///
/// The caller is never expected to await the handle. The write itself cannot
/// fail from the caller's side: remote errors fall back to the in-process map
/// and are logged inside [`TieredCache`].
///
/// # Arguments
/// * `cache` - Handle to the shared cache (clones share the same tiers)
/// * `full_key` - Key with the namespace prefix already applied
/// * `payload` - JSON-encoded value
/// * `ttl` - Time-to-live for the entry
///
/// # Example
/// ```ignore
/// let payload = serde_json::to_string(&categories)?;
/// spawn_populate(cache.clone(), cache.namespaced("categories:t1"), payload, TTL_SHORT);
/// ```
pub fn spawn_populate(
    cache: TieredCache,
    full_key: String,
    payload: String,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        cache.set_raw(&full_key, payload, ttl).await;
        debug!(
            key = %full_key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Background cache population finished"
        );
    })
}
