//! Process-local cache store.
//!
//! Used for ephemeral sessions and tests. Entries are kept as JSON text so
//! corrupt-entry handling matches the SQLite store exactly.

use super::{CacheError, CacheResult, CacheStore};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn read_text(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write_text(&self, key: &str, _namespace: &str, text: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::LockPoisoned)?;
        entries.insert(key.to_string(), text.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn list_keys(&self) -> CacheResult<Vec<String>> {
        let entries = self.entries.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn retain_only(&self, keep: &[String]) -> CacheResult<usize> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|key, _| keep.contains(key));
        Ok(before - entries.len())
    }
}
