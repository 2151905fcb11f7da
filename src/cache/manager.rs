// Response cache - handles cache key generation, lookup and expiry
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheConfig, CacheEntry, CacheStats};
use crate::metrics;
use crate::storage::KeyValueStore;
use chrono::Utc;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of every cache key in the shared store
pub const CACHE_KEY_PREFIX: &str = "picksy_cache_";

/// Persisted input → reply cache with a fixed time-to-live.
///
/// Every storage failure is swallowed here: a failed read is a miss and a
/// failed write leaves the reply uncached.
pub struct ResponseCache {
    config: CacheConfig,
    store: Arc<dyn KeyValueStore>,
    stats: RwLock<CacheStats>,
}

impl ResponseCache {
    /// Create a new response cache over `store`
    pub fn new(config: CacheConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            store,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Generate the storage key for an input string.
    ///
    /// Inputs are hashed verbatim, so "Hi" and "hi" are cached separately.
    pub fn cache_key(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        format!("{}{:x}", CACHE_KEY_PREFIX, hasher.finalize())
    }

    /// Look up a previously cached reply
    pub fn get(&self, input: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        let key = Self::cache_key(input);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.miss(&key),
            Err(e) => {
                warn!("Cache read error: {}", e);
                return self.miss(&key);
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", &key[..24], e);
                self.evict(&key);
                return self.miss(&key);
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        if age_ms >= self.ttl_millis() {
            debug!("Cache entry expired after {}ms", age_ms);
            self.evict(&key);
            self.stats.write().expired += 1;
            metrics::record_cache_expired();
            return self.miss(&key);
        }

        debug!("Cache hit: {}", &key[..24]);
        self.stats.write().hits += 1;
        metrics::record_cache_hit();
        Some(entry.result)
    }

    /// Store a reply, replacing any previous entry for the same input
    pub fn put(&self, input: &str, response: &str) {
        if !self.config.enabled {
            return;
        }

        let key = Self::cache_key(input);
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            result: response.to_string(),
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache save error: {}", e);
                return;
            }
        };

        match self.store.set(&key, &raw) {
            Ok(()) => {
                debug!("Cached reply under {}", &key[..24]);
                self.stats.write().writes += 1;
                metrics::record_cache_write();
            }
            Err(e) => {
                // Quota exhaustion and friends: continue uncached
                warn!("Cache save error: {}", e);
                self.stats.write().write_failures += 1;
                metrics::record_cache_write_error();
            }
        }
    }

    /// Remove every cached reply, leaving other keys in the store alone
    pub fn clear(&self) {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cache clear error: {}", e);
                return;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(CACHE_KEY_PREFIX)) {
            if self.store.remove(key).is_ok() {
                removed += 1;
            }
        }
        debug!("Cache cleared ({} entries)", removed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    fn miss(&self, key: &str) -> Option<String> {
        debug!("Cache miss for key: {}", &key[..24]);
        self.stats.write().misses += 1;
        metrics::record_cache_miss();
        None
    }

    fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("Cache evict error: {}", e);
        }
    }
}
