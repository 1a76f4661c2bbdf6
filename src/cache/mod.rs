//! Cache Module
//!
//! Remote-first caching with a bounded in-process fallback.

mod entry;
mod fallback;
pub mod keys;
mod memory;
mod pattern;
mod remote;
mod retry;
mod service;
mod stats;


// Re-export public types
pub use entry::FallbackEntry;
pub use fallback::FallbackStore;
pub use memory::MemoryRemote;
pub use pattern::{escape_glob, glob_match};
pub use remote::{RedisStore, RemoteStore};
pub use retry::RetryPolicy;
pub use service::TieredCache;
pub use stats::{CacheMetrics, CacheStats, RemoteStatus};

// == Public Constants ==
/// Namespace prepended to every key unless configured otherwise
pub const DEFAULT_KEY_PREFIX: &str = "storefront:";

/// Default capacity of the in-process fallback map
pub const FALLBACK_MAX_ENTRIES: usize = 1000;

/// Maximum allowed logical key length in bytes for admin writes
pub const MAX_KEY_LENGTH: usize = 256;

/// Longest TTL accepted by the remote store; longer TTLs are clamped to it
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
