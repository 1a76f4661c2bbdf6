//! Integration Tests for the tiered cache facade
//!
//! Exercises the public cache API over an in-memory remote, a real
//! `RedisStore` pointed at an address nothing listens on, and optionally a
//! live Redis named by `REDIS_TEST_URL`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use storefront_cache::cache::{
    keys, MemoryRemote, RedisStore, RemoteStatus, RemoteStore, RetryPolicy,
};
use storefront_cache::TieredCache;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CategoryListing {
    tenant: String,
    names: Vec<String>,
}

fn listing(tenant: &str) -> CategoryListing {
    CategoryListing {
        tenant: tenant.to_string(),
        names: vec!["Shoes".to_string(), "Hats".to_string()],
    }
}

fn unreachable_redis(cooldown: Duration) -> Arc<RedisStore> {
    Arc::new(
        RedisStore::new(
            "redis://127.0.0.1:1/0",
            Duration::from_millis(200),
            Duration::from_millis(200),
            cooldown,
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .unwrap(),
    )
}

// == Outage Resilience ==

#[tokio::test]
async fn test_set_then_get_survives_unreachable_redis() {
    let redis = unreachable_redis(Duration::from_secs(30));
    let cache = TieredCache::new(Some(redis.clone() as Arc<dyn RemoteStore>), "it:", 1000);

    cache
        .set(&keys::categories("tenantA"), &listing("tenantA"), keys::TTL_SHORT)
        .await;
    let cached: Option<CategoryListing> = cache.get(&keys::categories("tenantA")).await;

    assert_eq!(cached, Some(listing("tenantA")));
    assert_eq!(cache.remote_status(), RemoteStatus::Failed);
    assert!(cache.is_degraded());
    // One bounded connect cycle, then the cooldown suppresses reconnects
    assert_eq!(redis.connect_attempts(), 3);
}

#[tokio::test]
async fn test_cooldown_keeps_degraded_path_fast() {
    let redis = unreachable_redis(Duration::from_secs(30));
    let cache = TieredCache::new(Some(redis.clone() as Arc<dyn RemoteStore>), "it:", 1000);

    cache.set("warmup", &0u8, keys::TTL_SHORT).await;

    let started = Instant::now();
    for i in 0..200u32 {
        cache.set(&format!("k{}", i), &i, keys::TTL_SHORT).await;
        assert_eq!(cache.get::<u32>(&format!("k{}", i)).await, Some(i));
    }
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(redis.connect_attempts(), 3);
}

#[tokio::test]
async fn test_delete_pattern_during_outage() {
    let redis = unreachable_redis(Duration::from_secs(30));
    let cache = TieredCache::new(Some(redis as Arc<dyn RemoteStore>), "it:", 1000);

    cache.set(&keys::categories("tenantA"), &1, keys::TTL_SHORT).await;
    cache.set(&keys::categories("tenantB"), &2, keys::TTL_SHORT).await;

    let removed = cache
        .delete_pattern(&keys::categories_pattern("tenantA"))
        .await;

    assert_eq!(removed, 1);
    assert_eq!(cache.get::<i32>(&keys::categories("tenantA")).await, None);
    assert_eq!(cache.get::<i32>(&keys::categories("tenantB")).await, Some(2));
}

// == Remote Recovery ==

#[tokio::test]
async fn test_values_move_back_to_remote_after_recovery() {
    let remote = Arc::new(MemoryRemote::unavailable());
    let cache = TieredCache::new(Some(remote.clone() as Arc<dyn RemoteStore>), "it:", 100);

    cache.set("settings:t1", &"v1", keys::TTL_EXTENDED).await;
    assert_eq!(cache.fallback_len().await, 1);

    remote.set_available(true);
    // Fallback copy is still served until the remote has the key
    assert_eq!(cache.get::<String>("settings:t1").await, Some("v1".to_string()));

    cache.set("settings:t1", &"v2", keys::TTL_EXTENDED).await;
    assert_eq!(remote.peek("it:settings:t1").await, Some("\"v2\"".to_string()));
    assert_eq!(cache.fallback_len().await, 0);
}

// == Get Or Set ==

#[tokio::test]
async fn test_get_or_set_populates_in_background() {
    let remote = Arc::new(MemoryRemote::new());
    let cache = TieredCache::new(Some(remote.clone() as Arc<dyn RemoteStore>), "it:", 100);
    let calls = AtomicUsize::new(0);
    let key = keys::dashboard("t1", "revenue", "7d");

    let first: Result<u64, String> = cache
        .get_or_set(
            &key,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1234)
            },
            keys::TTL_MEDIUM,
        )
        .await;
    assert_eq!(first, Ok(1234));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(remote.peek(&cache.namespaced(&key)).await.is_some());

    let second: Result<u64, String> = cache
        .get_or_set(
            &key,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            },
            keys::TTL_MEDIUM,
        )
        .await;
    assert_eq!(second, Ok(1234));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_set_returns_value_when_write_back_fails() {
    let redis = unreachable_redis(Duration::from_secs(30));
    let cache = TieredCache::new(Some(redis as Arc<dyn RemoteStore>), "it:", 100);

    let value: Result<CategoryListing, String> = cache
        .get_or_set(
            &keys::categories("tenantC"),
            || async { Ok(listing("tenantC")) },
            keys::TTL_SHORT,
        )
        .await;

    assert_eq!(value, Ok(listing("tenantC")));
}

// == Shutdown ==

#[tokio::test]
async fn test_shutdown_then_lazy_reuse() {
    let remote = Arc::new(MemoryRemote::new());
    let cache = TieredCache::new(Some(remote as Arc<dyn RemoteStore>), "it:", 100);

    cache.set("k", &1, keys::TTL_REALTIME).await;
    cache.shutdown().await;
    assert_eq!(cache.get::<i32>("k").await, Some(1));
}

// == Live Redis (optional) ==

#[tokio::test]
async fn test_live_redis_round_trip_if_configured() {
    let Ok(url) = std::env::var("REDIS_TEST_URL") else {
        eprintln!("REDIS_TEST_URL not set, skipping live Redis test");
        return;
    };

    let redis = Arc::new(
        RedisStore::new(
            &url,
            Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::from_secs(30),
            RetryPolicy::default(),
        )
        .unwrap(),
    );
    let cache = TieredCache::new(
        Some(redis.clone() as Arc<dyn RemoteStore>),
        format!("storefront-test-{}:", std::process::id()),
        100,
    );

    cache.set(&keys::categories("tenantA"), &listing("tenantA"), keys::TTL_SHORT).await;
    cache.set(&keys::categories("tenantB"), &listing("tenantB"), keys::TTL_SHORT).await;
    assert_eq!(redis.status(), RemoteStatus::Ready);
    assert_eq!(cache.fallback_len().await, 0);

    assert_eq!(
        cache.delete_pattern(&keys::categories_pattern("tenantA")).await,
        1
    );
    assert_eq!(
        cache.get::<CategoryListing>(&keys::categories("tenantB")).await,
        Some(listing("tenantB"))
    );

    cache.delete(&keys::categories("tenantB")).await;
    cache.shutdown().await;
}
