//! Result caching with per-entry TTL.
//!
//! This crate holds the gateway's cache of successful idempotent reads. Entries
//! expire lazily: an expired entry is removed by the lookup that finds it.

#![warn(missing_docs)]

mod cache;

pub use cache::{CacheEntry, ResultCache, ResultCacheConfig, ResultCacheConfigBuilder};
