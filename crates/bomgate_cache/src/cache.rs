//! Result cache implementation.

use dashmap::DashMap;
use derive_getters::Getters;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    value: JsonValue,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }
}

/// Configuration for the result cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct ResultCacheConfig {
    /// TTL applied when the caller does not supply one (seconds)
    #[serde(default = "default_ttl")]
    default_ttl: u64,

    /// Maximum cache size (number of entries). Zero stores nothing.
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_max_size() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

/// Concurrent cache of successful operation results.
///
/// Keys are built by the caller and must be stable for identical logical
/// requests. Values are stored JSON-encoded so that a single cache can hold the
/// results of every operation the gateway runs. All methods take `&self`; the
/// cache can be shared freely between tasks.
///
/// # Example
///
/// ```
/// use bomgate_cache::{ResultCache, ResultCacheConfig};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let cache = ResultCache::new(ResultCacheConfig::default());
///
/// cache.put("GetResource:bom12", json!({"item_count": 42}), Some(Duration::from_secs(60)));
///
/// assert_eq!(cache.get("GetResource:bom12"), Some(json!({"item_count": 42})));
///
/// cache.invalidate("GetResource:bom12");
/// assert!(cache.get("GetResource:bom12").is_none());
/// ```
#[derive(Debug)]
pub struct ResultCache {
    config: ResultCacheConfig,
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    /// Create a new result cache with configuration.
    pub fn new(config: ResultCacheConfig) -> Self {
        tracing::debug!(
            default_ttl = config.default_ttl,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new ResultCache"
        );
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Configuration this cache was built with.
    pub fn config(&self) -> &ResultCacheConfig {
        &self.config
    }

    /// Store a value under `key`, replacing any previous entry.
    ///
    /// `ttl` falls back to the configured default when `None`.
    #[tracing::instrument(skip(self, value), fields(cache_size = self.entries.len()))]
    pub fn put(&self, key: &str, value: JsonValue, ttl: Option<Duration>) {
        if !self.config.enabled || self.config.max_size == 0 {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        let ttl = ttl.unwrap_or(Duration::from_secs(self.config.default_ttl));
        if ttl.is_zero() {
            tracing::debug!("Zero TTL, skipping insert");
            return;
        }

        if self.entries.len() >= self.config.max_size && !self.entries.contains_key(key) {
            self.cleanup_expired();
            if self.entries.len() >= self.config.max_size {
                self.evict_oldest();
            }
        }

        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl,
        };

        tracing::debug!(ttl = ?ttl, "Inserted entry into cache");
        self.entries.insert(key.to_string(), entry);
    }

    /// Serialize and store a value.
    pub fn put_typed<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.put(key, value, ttl);
        Ok(())
    }

    /// Look up a live entry.
    ///
    /// An entry found past its expiry is removed and reported as a miss.
    #[tracing::instrument(skip(self), fields(cache_size = self.entries.len()))]
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        if !self.config.enabled {
            return None;
        }

        if let Some(entry) = self.entries.get(key)
            && !entry.is_expired()
        {
            tracing::debug!(time_remaining = ?entry.time_remaining(), "Cache hit");
            return Some(entry.value.clone());
        }

        // Re-checks expiry under the shard lock, so a fresh entry written
        // concurrently is never dropped.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            tracing::debug!("Cache entry expired, removed");
        }
        None
    }

    /// Look up and deserialize a live entry.
    ///
    /// An entry that no longer decodes as `T` is dropped and treated as a miss.
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key, error = %e, "Cached value has unexpected shape, discarding");
                self.invalidate(key);
                None
            }
        }
    }

    /// Remove the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        tracing::debug!(key, removed, "Invalidated cache key");
        removed
    }

    /// Remove every listed key. Returns how many entries were present.
    pub fn invalidate_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter(|key| self.invalidate(key.as_ref()))
            .count()
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!(prefix, removed, "Invalidated cache prefix");
        removed
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.entries.len(), "Cleaned up expired cache entries");
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Get number of cached entries (expired ones not yet swept included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the entry inserted longest ago.
    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            tracing::debug!(key = %key, "Evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(ResultCacheConfig::default())
    }
}
