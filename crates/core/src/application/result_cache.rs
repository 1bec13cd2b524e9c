// Last reported ports per instance (bounded LRU)
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use crate::domain::{InstanceKey, PortNumber};

use super::constants::RESULT_CACHE_CAPACITY;

/// Bounded memo of the most recent port list observed per instance
///
/// Safe to share between concurrently running probes. The lock is never held
/// across an await point.
pub struct PortsCache {
    inner: Mutex<LruCache<InstanceKey, Vec<PortNumber>>>,
}

impl PortsCache {
    /// Create a cache holding at most `capacity` instances (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record `ports` as the latest report for `key`
    ///
    /// Returns `true` when the value differs from the cached one (or nothing
    /// was cached), `false` when the report is unchanged.
    pub fn record(&self, key: InstanceKey, ports: &[PortNumber]) -> bool {
        self.record_then(key, ports, |changed| changed)
    }

    /// Record `ports` and run `then` with the change flag before the cache
    /// lock is released
    ///
    /// Callers recording the same key run `then` in the order their values
    /// were stored. `then` must not touch this cache.
    pub fn record_then<R>(
        &self,
        key: InstanceKey,
        ports: &[PortNumber],
        then: impl FnOnce(bool) -> R,
    ) -> R {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let unchanged = cache
            .get(&key)
            .is_some_and(|previous| previous.as_slice() == ports);
        if !unchanged {
            cache.put(key, ports.to_vec());
        }
        then(!unchanged)
    }

    /// Cached ports for `key` without touching recency
    pub fn peek(&self, key: &InstanceKey) -> Option<Vec<PortNumber>> {
        let cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.peek(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }
}

impl Default for PortsCache {
    fn default() -> Self {
        Self::new(RESULT_CACHE_CAPACITY)
    }
}
