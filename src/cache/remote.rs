//! Remote Store Module
//!
//! The shared primary tier. `RedisStore` connects lazily on first use,
//! retries connecting a bounded number of times, and after a failure stays
//! quiet for a cooldown window before trying again:
//!
//! ```text
//! uninitialized -> connecting -> ready
//! connecting -> failed -> (cooldown) -> connecting
//! ready -> failed   (timeout or dropped connection)
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::retry::{retry, RetryPolicy};
use crate::cache::stats::RemoteStatus;
use crate::cache::MAX_TTL_SECS;
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Remote Store Trait ==
/// Primary cache tier operating on fully namespaced keys.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SETEX key ttl value`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// `DEL key [key ...]`, returning the number of keys removed.
    async fn delete(&self, keys: &[String]) -> Result<usize>;

    /// `KEYS pattern`
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Current connection state, without blocking.
    fn status(&self) -> RemoteStatus;

    /// Releases the connection, if any.
    async fn close(&self) {}
}

// == Connection State ==
enum ConnectionState {
    Uninitialized,
    Ready(MultiplexedConnection),
    Failed { since: Instant },
}

/// Whether a reconnect may be attempted `now`, given a failure at `since`.
pub fn cooldown_elapsed(since: Instant, cooldown: Duration, now: Instant) -> bool {
    now.saturating_duration_since(since) >= cooldown
}

/// Whole seconds for `SETEX`, which rejects zero and overly large expiries.
fn setex_seconds(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis().div_ceil(1000))
        .unwrap_or(u64::MAX)
        .clamp(1, MAX_TTL_SECS)
}

fn status_to_u8(status: RemoteStatus) -> u8 {
    match status {
        RemoteStatus::Disabled => 0,
        RemoteStatus::Uninitialized => 1,
        RemoteStatus::Connecting => 2,
        RemoteStatus::Ready => 3,
        RemoteStatus::Failed => 4,
    }
}

fn status_from_u8(raw: u8) -> RemoteStatus {
    match raw {
        0 => RemoteStatus::Disabled,
        1 => RemoteStatus::Uninitialized,
        2 => RemoteStatus::Connecting,
        3 => RemoteStatus::Ready,
        _ => RemoteStatus::Failed,
    }
}

// == Redis Store ==
/// Lazily connected Redis client with connect retry and reconnect cooldown.
pub struct RedisStore {
    client: redis::Client,
    state: Mutex<ConnectionState>,
    /// Mirror of `state` readable without awaiting the lock
    status: AtomicU8,
    connect_timeout: Duration,
    command_timeout: Duration,
    cooldown: Duration,
    retry: RetryPolicy,
    connect_attempts: AtomicU64,
}

impl RedisStore {
    /// Creates a store for `url`. No connection is made until first use.
    pub fn new(
        url: &str,
        connect_timeout: Duration,
        command_timeout: Duration,
        cooldown: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Connection(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            state: Mutex::new(ConnectionState::Uninitialized),
            status: AtomicU8::new(status_to_u8(RemoteStatus::Uninitialized)),
            connect_timeout,
            command_timeout,
            cooldown,
            retry,
            connect_attempts: AtomicU64::new(0),
        })
    }

    /// Creates a store from the service configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.redis_url(),
            config.connect_timeout,
            config.command_timeout,
            config.reconnect_cooldown,
            RetryPolicy::new(config.max_connect_attempts, Duration::from_millis(200)),
        )
    }

    /// Total individual connect attempts made so far.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    fn set_status(&self, status: RemoteStatus) {
        self.status.store(status_to_u8(status), Ordering::Relaxed);
    }

    // == Connection ==
    /// Returns a ready connection, connecting if needed.
    ///
    /// Returns `None` without touching the network while inside the cooldown
    /// window of a previous failure. Concurrent callers share one attempt.
    pub async fn connection(&self) -> Option<MultiplexedConnection> {
        let mut state = self.state.lock().await;
        match &*state {
            ConnectionState::Ready(conn) => return Some(conn.clone()),
            ConnectionState::Failed { since }
                if !cooldown_elapsed(*since, self.cooldown, Instant::now()) =>
            {
                debug!("Redis in cooldown, skipping reconnect");
                return None;
            }
            _ => {}
        }

        self.set_status(RemoteStatus::Connecting);
        info!("Connecting to Redis");

        let result = retry("redis_connect", &self.retry, || async {
            self.connect_attempts.fetch_add(1, Ordering::Relaxed);
            match timeout(
                self.connect_timeout,
                self.client.get_multiplexed_async_connection_with_timeouts(
                    self.command_timeout,
                    self.connect_timeout,
                ),
            )
            .await
            {
                Ok(Ok(conn)) => Ok(conn),
                Ok(Err(e)) => Err(CacheError::from(e)),
                Err(_) => Err(CacheError::Timeout("redis connect".to_string())),
            }
        })
        .await;

        match result {
            Ok(conn) => {
                info!("Redis connected");
                *state = ConnectionState::Ready(conn.clone());
                self.set_status(RemoteStatus::Ready);
                Some(conn)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cooldown_secs = self.cooldown.as_secs(),
                    "Redis unavailable, using in-process fallback"
                );
                *state = ConnectionState::Failed {
                    since: Instant::now(),
                };
                self.set_status(RemoteStatus::Failed);
                None
            }
        }
    }

    /// Drops a live connection after a runtime failure and starts the cooldown.
    async fn mark_failed(&self, error: &CacheError) {
        let mut state = self.state.lock().await;
        if matches!(*state, ConnectionState::Ready(_)) {
            warn!(error = %error, "Redis connection lost");
            *state = ConnectionState::Failed {
                since: Instant::now(),
            };
            self.set_status(RemoteStatus::Failed);
        }
    }

    /// Runs one command with the command timeout applied.
    async fn run<T, F, Fut>(&self, command: &str, op: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self
            .connection()
            .await
            .ok_or_else(|| CacheError::Connection("redis unavailable".to_string()))?;

        let result = match timeout(self.command_timeout, op(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::from(e)),
            Err(_) => Err(CacheError::Timeout(format!("redis {}", command))),
        };

        if let Err(e) = &result {
            if e.is_connection_loss() {
                self.mark_failed(e).await;
            }
        }
        result
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.run("GET", |mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        let seconds = setex_seconds(ttl);
        self.run("SETEX", |mut conn| async move {
            conn.set_ex::<_, _, ()>(key, value, seconds).await
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys = keys.to_vec();
        self.run("DEL", |mut conn| async move { conn.del(keys).await })
            .await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.to_string();
        self.run("KEYS", |mut conn| async move { conn.keys(pattern).await })
            .await
    }

    fn status(&self) -> RemoteStatus {
        status_from_u8(self.status.load(Ordering::Relaxed))
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, ConnectionState::Ready(_)) {
            info!("Redis connection closed");
        }
        *state = ConnectionState::Uninitialized;
        self.set_status(RemoteStatus::Uninitialized);
    }
}
