// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod manager;
pub mod models;

pub use manager::{ResponseCache, CACHE_KEY_PREFIX};
pub use models::{CacheConfig, CacheEntry, CacheStats};
