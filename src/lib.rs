//! Storefront Cache - tiered caching for the storefront admin backend
//!
//! Redis is the primary tier; a bounded in-process map takes over
//! transparently whenever Redis is unreachable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::TieredCache;
pub use config::Config;
