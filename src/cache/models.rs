//! Cache configuration, entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

use crate::config::CacheSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// How long an entry stays valid after it was written.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    /// Provides default values for cache configuration.
    ///
    /// - `enabled`: true
    /// - `ttl`: 24 hours
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_hours.saturating_mul(60 * 60)),
        }
    }
}

/// A persisted reply, as stored in the key-value store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The cached reply text.
    pub result: String,
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Number of successful cache hits.
    pub hits: u64,
    /// Number of cache misses (absent, unreadable or expired).
    pub misses: u64,
    /// Number of entries written.
    pub writes: u64,
    /// Number of expired entries removed on read.
    pub expired: u64,
    /// Number of writes the store rejected.
    pub write_failures: u64,
}
