//! In-memory cache store.

use dashmap::DashMap;
use ginku_core::{CacheKey, CacheValue};

/// Mapping from cache key to the last successfully fetched value.
///
/// Unbounded: the key space is one entry per distinct operation and
/// parameter combination actually requested. Entries are only replaced by
/// newer writes or removed explicitly; staleness is decided by readers.
#[derive(Debug)]
pub(crate) struct CacheStore<V> {
    entries: DashMap<CacheKey, CacheValue<V>>,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> CacheStore<V> {
    pub(crate) fn get(&self, key: &CacheKey) -> Option<CacheValue<V>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value`, stamped with the current instant, replacing any previous entry.
    pub(crate) fn set(&self, key: CacheKey, value: V) {
        self.entries.insert(key, CacheValue::new(value));
    }
}

impl<V> CacheStore<V> {
    pub(crate) fn delete(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
