//! Background Tasks Module
//!
//! Detached work scheduled by the cache facade.
//!
//! # Tasks
//! - Populate: writes a freshly computed value back into the cache without
//!   making the caller wait

mod populate;

pub use populate::spawn_populate;
