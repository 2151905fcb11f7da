//! Persistent key-value storage.
//!
//! Picksy keeps its reply cache and conversation in a flat string-to-string
//! store, the same shape as browser local storage. Writes may fail once the
//! configured quota is reached; callers treat that as non-fatal.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use std::sync::Arc;

/// A string key-value store supplied by the host environment.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Build the store described by `config`.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let quota = (config.quota_bytes > 0).then_some(config.quota_bytes);
    match config.backend {
        StorageBackend::File => Ok(Arc::new(FileStore::open(&config.path, quota)?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::with_quota(quota))),
    }
}

/// Bytes a set of entries occupies against the quota.
pub(crate) fn usage<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> usize {
    entries.map(|(k, v)| k.len() + v.len()).sum()
}
