//! In-memory remote store.
//!
//! Behaves like the Redis tier but lives in the process, with a switch to
//! simulate an outage. Lets tests drive the facade without a Redis server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::pattern::glob_match;
use crate::cache::remote::RemoteStore;
use crate::cache::stats::RemoteStatus;
use crate::error::{CacheError, Result};

/// Remote tier backed by a process-local map.
#[derive(Debug)]
pub struct MemoryRemote {
    /// Value and deadline; `None` never expires
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
    available: AtomicBool,
    commands: AtomicU64,
}

impl MemoryRemote {
    /// Creates a reachable, empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            commands: AtomicU64::new(0),
        }
    }

    /// Creates a store that fails every command.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    /// Toggles the simulated outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of commands received, including failed ones.
    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::SeqCst)
    }

    /// Raw stored value for a namespaced key, ignoring availability.
    pub async fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(_, expires)| is_live(*expires, Instant::now()))
            .map(|(value, _)| value.clone())
    }

    fn check(&self) -> Result<()> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Connection("simulated outage".to_string()))
        }
    }
}

fn is_live(expires: Option<Instant>, now: Instant) -> bool {
    expires.map_or(true, |deadline| now < deadline)
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.peek(key).await)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        let mut entries = self.entries.write().await;
        let expires = Instant::now().checked_add(ttl);
        entries.insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        self.check()?;
        let mut entries = self.entries.write().await;
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check()?;
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(key, (_, expires))| is_live(*expires, now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn status(&self) -> RemoteStatus {
        if self.available.load(Ordering::SeqCst) {
            RemoteStatus::Ready
        } else {
            RemoteStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_expiry() {
        let remote = MemoryRemote::new();
        remote
            .set_ex("k", "1", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(remote.get("k").await.unwrap(), Some("1".to_string()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(remote.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let remote = MemoryRemote::new();
        remote
            .set_ex("k", "1", Duration::from_secs(1 << 61))
            .await
            .unwrap();
        assert_eq!(remote.get("k").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_outage_fails_commands() {
        let remote = MemoryRemote::unavailable();
        assert!(remote.get("k").await.is_err());
        assert!(remote.keys("*").await.is_err());
        assert_eq!(remote.status(), RemoteStatus::Failed);
        assert_eq!(remote.commands(), 2);
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let remote = MemoryRemote::new();
        let ttl = Duration::from_secs(60);
        remote.set_ex("p:a:1", "1", ttl).await.unwrap();
        remote.set_ex("p:a:2", "2", ttl).await.unwrap();
        remote.set_ex("p:b:1", "3", ttl).await.unwrap();

        let mut keys = remote.keys("p:a:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["p:a:1".to_string(), "p:a:2".to_string()]);

        assert_eq!(remote.delete(&keys).await.unwrap(), 2);
        assert_eq!(remote.peek("p:b:1").await, Some("3".to_string()));
    }
}
