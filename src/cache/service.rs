//! Tiered Cache Facade
//!
//! Single entry point for callers. Each operation tries the remote store and
//! falls back to the in-process map; no backend failure ever reaches the
//! caller, who only sees a value or its absence.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::fallback::FallbackStore;
use crate::cache::pattern::escape_glob;
use crate::cache::remote::{RedisStore, RemoteStore};
use crate::cache::stats::{CacheMetrics, CacheStats, RemoteStatus};
use crate::config::Config;
use crate::error::CacheError;
use crate::tasks::spawn_populate;

type FillLocks = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

fn lock_fill_map(locks: &FillLocks) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-key fill lock handle. Removes the map entry on drop once no other
/// caller holds it, including when the owning future is cancelled.
struct FillLock {
    locks: FillLocks,
    key: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for FillLock {
    fn drop(&mut self) {
        let mut locks = lock_fill_map(&self.locks);
        // Only the map and this handle hold it: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

// == Tiered Cache ==
/// Remote-first cache with a bounded in-process fallback.
///
/// Cloning is cheap and every clone shares the same tiers, so one instance
/// is built at startup and handed to whatever needs caching.
#[derive(Clone)]
pub struct TieredCache {
    remote: Option<Arc<dyn RemoteStore>>,
    fallback: Arc<RwLock<FallbackStore>>,
    metrics: Arc<CacheMetrics>,
    prefix: Arc<str>,
    fill_locks: FillLocks,
}

impl TieredCache {
    // == Constructors ==
    /// Builds a cache over `remote`, or over the fallback alone when `None`.
    pub fn new(
        remote: Option<Arc<dyn RemoteStore>>,
        prefix: impl Into<String>,
        fallback_max_entries: usize,
    ) -> Self {
        Self {
            remote,
            fallback: Arc::new(RwLock::new(FallbackStore::new(fallback_max_entries))),
            metrics: Arc::new(CacheMetrics::new()),
            prefix: Arc::from(prefix.into()),
            fill_locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Builds a cache with no remote tier.
    pub fn fallback_only(prefix: impl Into<String>, fallback_max_entries: usize) -> Self {
        Self::new(None, prefix, fallback_max_entries)
    }

    /// Builds the cache described by `config`.
    ///
    /// An unusable Redis URL is logged and the cache runs on the fallback only.
    pub fn from_config(config: &Config) -> Self {
        let remote: Option<Arc<dyn RemoteStore>> = if config.redis_enabled {
            match RedisStore::from_config(config) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e, "Redis disabled, cache will use in-process fallback only");
                    None
                }
            }
        } else {
            None
        };
        Self::new(remote, config.key_prefix.clone(), config.fallback_max_entries)
    }

    /// Prepends the namespace prefix to a logical key.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn namespaced_pattern(&self, pattern: &str) -> String {
        format!("{}{}", escape_glob(&self.prefix), pattern)
    }

    // == Set ==
    /// Stores `value` for `ttl`.
    ///
    /// Writes to the remote store, or to the fallback map if that fails.
    /// Never fails from the caller's point of view.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(payload) => self.set_raw(&self.namespaced(key), payload, ttl).await,
            Err(e) => warn!(key = %key, error = %e, "Value not cacheable, skipping write"),
        }
    }

    /// Stores an already serialized payload under a namespaced key.
    pub(crate) async fn set_raw(&self, full_key: &str, payload: String, ttl: Duration) {
        if let Some(remote) = &self.remote {
            match remote.set_ex(full_key, &payload, ttl).await {
                Ok(()) => {
                    debug!(key = %full_key, ttl_secs = ttl.as_secs(), "cache set (remote)");
                    // Drop any older copy left behind by an outage
                    self.fallback.write().await.delete(full_key);
                    return;
                }
                Err(e) => self.record_remote_failure("SETEX", full_key, &e),
            }
        }

        self.metrics.record_fallback_write();
        self.fallback
            .write()
            .await
            .set(full_key.to_string(), payload, ttl);
        debug!(key = %full_key, ttl_secs = ttl.as_secs(), "cache set (fallback)");
    }

    // == Get ==
    /// Returns the cached value, or `None` if absent, expired or undecodable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.namespaced(key);

        if let Some(remote) = &self.remote {
            match remote.get(&full_key).await {
                Ok(Some(payload)) => match serde_json::from_str(&payload) {
                    Ok(value) => {
                        self.metrics.record_remote_hit();
                        return Some(value);
                    }
                    Err(e) => self.record_decode_failure(&full_key, &e),
                },
                Ok(None) => {}
                Err(e) => self.record_remote_failure("GET", &full_key, &e),
            }
        }

        let payload = self.fallback.write().await.get(&full_key);
        match payload.map(|p| serde_json::from_str(&p)) {
            Some(Ok(value)) => {
                self.metrics.record_fallback_hit();
                Some(value)
            }
            Some(Err(e)) => {
                self.record_decode_failure(&full_key, &e);
                self.metrics.record_miss();
                None
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes `key` from both tiers. Absent keys are a no-op.
    pub async fn delete(&self, key: &str) {
        let full_key = self.namespaced(key);

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.delete(std::slice::from_ref(&full_key)).await {
                self.record_remote_failure("DEL", &full_key, &e);
            }
        }

        self.fallback.write().await.delete(&full_key);
    }

    // == Delete Pattern ==
    /// Removes every key matching the glob `pattern` (relative to the
    /// namespace) from both tiers.
    ///
    /// Returns how many entries were removed, for logging only.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let full_pattern = self.namespaced_pattern(pattern);
        let mut removed = 0;

        if let Some(remote) = &self.remote {
            match remote.keys(&full_pattern).await {
                Ok(keys) => match remote.delete(&keys).await {
                    Ok(count) => removed += count,
                    Err(e) => self.record_remote_failure("DEL", &full_pattern, &e),
                },
                Err(e) => self.record_remote_failure("KEYS", &full_pattern, &e),
            }
        }

        removed += self.fallback.write().await.delete_matching(&full_pattern);
        debug!(pattern = %full_pattern, removed, "cache pattern invalidated");
        removed
    }

    // == Get Or Set ==
    /// Returns the cached value, or computes it with `factory`.
    ///
    /// On a miss the computed value is returned right away and written back
    /// by a detached task; the caller never waits on or observes that write.
    /// Concurrent misses may each run `factory`; the last write wins.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Duration,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = factory().await?;
        self.populate_detached(key, &value, ttl);
        Ok(value)
    }

    /// Like [`get_or_set`](Self::get_or_set), but concurrent misses on the
    /// same key share a single `factory` call.
    ///
    /// The write-back completes before waiters are released so they read it.
    pub async fn get_or_set_coalesced<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Duration,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let fill = self.acquire_fill_lock(self.namespaced(key));
        let _held = fill.lock.lock().await;
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        let value = factory().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Serializes `value` and schedules its write on a detached task.
    ///
    /// Returns the task handle, or `None` if the value could not be serialized.
    pub fn populate_detached<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Option<JoinHandle<()>> {
        match serde_json::to_string(value) {
            Ok(payload) => Some(spawn_populate(
                self.clone(),
                self.namespaced(key),
                payload,
                ttl,
            )),
            Err(e) => {
                warn!(key = %key, error = %e, "Value not cacheable, skipping population");
                None
            }
        }
    }

    fn acquire_fill_lock(&self, full_key: String) -> FillLock {
        let lock = {
            let mut locks = lock_fill_map(&self.fill_locks);
            Arc::clone(
                locks
                    .entry(full_key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        FillLock {
            locks: Arc::clone(&self.fill_locks),
            key: full_key,
            lock,
        }
    }

    // == Health & Stats ==
    /// State of the remote tier; `Disabled` when running on the fallback only.
    pub fn remote_status(&self) -> RemoteStatus {
        self.remote
            .as_ref()
            .map(|remote| remote.status())
            .unwrap_or(RemoteStatus::Disabled)
    }

    /// True while a configured remote store is known to be unreachable.
    pub fn is_degraded(&self) -> bool {
        self.remote_status() == RemoteStatus::Failed
    }

    pub async fn stats(&self) -> CacheStats {
        let fallback = self.fallback.read().await;
        self.metrics
            .snapshot(fallback.evictions(), fallback.len(), self.remote_status())
    }

    /// Number of entries currently held in the fallback map.
    pub async fn fallback_len(&self) -> usize {
        self.fallback.read().await.len()
    }

    /// Closes the remote connection. The cache stays usable and reconnects lazily.
    pub async fn shutdown(&self) {
        if let Some(remote) = &self.remote {
            remote.close().await;
        }
    }

    fn record_remote_failure(&self, command: &str, key: &str, error: &CacheError) {
        self.metrics.record_remote_error();
        if error.is_connection_loss() {
            debug!(command, key = %key, error = %error, "Remote cache unavailable");
        } else {
            warn!(command, key = %key, error = %error, "Remote cache command failed");
        }
    }

    fn record_decode_failure(&self, key: &str, error: &serde_json::Error) {
        self.metrics.record_decode_error();
        warn!(key = %key, error = %error, "Cached payload undecodable, treating as miss");
    }
}
