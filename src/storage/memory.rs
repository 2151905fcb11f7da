// In-memory key-value store
// Author: kelexine (https://github.com/kelexine)

use super::{usage, KeyValueStore};
use crate::error::{PicksyError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local store, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes pushing total usage past `quota` bytes.
    pub fn with_quota(quota: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota {
            let current = usage(entries.iter().filter(|(k, _)| k.as_str() != key));
            if current + key.len() + value.len() > quota {
                return Err(PicksyError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
