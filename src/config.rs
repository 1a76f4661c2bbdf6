//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_KEY_PREFIX, FALLBACK_MAX_ENTRIES};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Complete Redis connection URL; overrides the host/port/password/db fields
    pub redis_url: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub redis_db: u32,
    /// When false the cache runs on the in-process fallback only
    pub redis_enabled: bool,
    /// Namespace prepended to every key in both tiers
    pub key_prefix: String,
    /// Maximum number of entries held by the in-process fallback
    pub fallback_max_entries: usize,
    /// Default TTL in seconds for admin writes without an explicit TTL
    pub default_ttl: u64,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    /// Connection attempts per connect cycle before entering cooldown
    pub max_connect_attempts: usize,
    /// Window after a failed connect during which no reconnect is attempted
    pub reconnect_cooldown: Duration,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Full connection URL (default: unset)
    /// - `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD` / `REDIS_DB`
    ///   (default: 127.0.0.1 / 6379 / unset / 0)
    /// - `CACHE_REDIS_ENABLED` - Use Redis as the primary tier (default: true)
    /// - `CACHE_KEY_PREFIX` - Key namespace (default: "storefront:")
    /// - `CACHE_FALLBACK_MAX_ENTRIES` - Fallback capacity (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `REDIS_CONNECT_TIMEOUT_MS` / `REDIS_COMMAND_TIMEOUT_MS` (default: 5000)
    /// - `REDIS_MAX_CONNECT_ATTEMPTS` - Connect retries per cycle (default: 3)
    /// - `REDIS_RECONNECT_COOLDOWN_SECS` - Cooldown after failure (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_env("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
            redis_db: parse_env("REDIS_DB").unwrap_or(defaults.redis_db),
            redis_enabled: parse_env("CACHE_REDIS_ENABLED").unwrap_or(defaults.redis_enabled),
            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            fallback_max_entries: parse_env("CACHE_FALLBACK_MAX_ENTRIES")
                .unwrap_or(defaults.fallback_max_entries),
            default_ttl: parse_env("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            connect_timeout: parse_env("REDIS_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            command_timeout: parse_env("REDIS_COMMAND_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_timeout),
            max_connect_attempts: parse_env("REDIS_MAX_CONNECT_ATTEMPTS")
                .unwrap_or(defaults.max_connect_attempts),
            reconnect_cooldown: parse_env("REDIS_RECONNECT_COOLDOWN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_cooldown),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Returns the Redis connection string.
    ///
    /// `REDIS_URL` wins when present; otherwise the URL is assembled from the
    /// individual host, port, password and database fields. The password is
    /// percent-encoded.
    pub fn redis_url(&self) -> String {
        if let Some(url) = &self.redis_url {
            return url.clone();
        }
        match &self.redis_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.redis_host,
                self.redis_port,
                self.redis_db
            ),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_db: 0,
            redis_enabled: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            fallback_max_entries: FALLBACK_MAX_ENTRIES,
            default_ttl: 300,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
            max_connect_attempts: 3,
            reconnect_cooldown: Duration::from_secs(30),
            server_port: 3000,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.redis_enabled);
        assert_eq!(config.key_prefix, "storefront:");
        assert_eq!(config.fallback_max_entries, 1000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.max_connect_attempts, 3);
        assert_eq!(config.reconnect_cooldown, Duration::from_secs(30));
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_redis_url_from_parts() {
        let config = Config::default();
        assert_eq!(config.redis_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_redis_url_with_password_and_db() {
        let config = Config {
            redis_host: "cache.internal".to_string(),
            redis_port: 6380,
            redis_password: Some("s3cret".to_string()),
            redis_db: 2,
            ..Config::default()
        };
        assert_eq!(config.redis_url(), "redis://:s3cret@cache.internal:6380/2");
    }

    #[test]
    fn test_redis_url_encodes_password() {
        let config = Config {
            redis_password: Some("p@ss/w:rd".to_string()),
            ..Config::default()
        };
        let url = config.redis_url();
        assert_eq!(url, "redis://:p%40ss%2Fw%3Ard@127.0.0.1:6379/0");

        let client = redis::Client::open(url.as_str()).unwrap();
        let info = client.get_connection_info();
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/w:rd"));
        assert_eq!(info.redis.db, 0);
    }

    #[test]
    fn test_redis_url_override_wins() {
        let config = Config {
            redis_url: Some("redis://example:6379/5".to_string()),
            redis_password: Some("ignored".to_string()),
            ..Config::default()
        };
        assert_eq!(config.redis_url(), "redis://example:6379/5");
    }
}
