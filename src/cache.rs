//! Modification-aware memoizing cache.
//!
//! Not an LRU: a cached value can go stale without ever being read, because
//! its inputs live on the filesystem. Every lookup therefore re-checks
//! freshness — the caller's `modified` probe (typically a max over file
//! mtimes) against the entry's computation time — before the cache is
//! trusted. Recency order is by *computation* time, re-derived after every
//! insert, and eviction drops the oldest entries once the optional bound is
//! exceeded.
//!
//! A per-instance mutex serializes lookup+update, so two concurrent callers
//! asking for the same stale key cannot both recompute and race on the
//! eviction order. Expected concurrency is low; anything fancier would be
//! wasted here.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::SystemTime;

struct Entry<V> {
    computed_at: SystemTime,
    value: V,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Keys ordered oldest-computed first.
    order: Vec<K>,
}

/// A cache of computed values validated by external modification times.
pub struct ModifiedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_entries: Option<usize>,
}

impl<K: Eq + Hash + Clone, V: Clone> ModifiedCache<K, V> {
    /// An unbounded cache.
    pub fn new() -> Self {
        Self::with_bound(None)
    }

    /// A cache evicting oldest-first beyond `max_entries`.
    pub fn bounded(max_entries: usize) -> Self {
        Self::with_bound(Some(max_entries))
    }

    fn with_bound(max_entries: Option<usize>) -> Self {
        ModifiedCache {
            inner: Mutex::new(Inner { entries: HashMap::new(), order: Vec::new() }),
            max_entries,
        }
    }

    /// Return the cached value for `key` if it is still fresh, otherwise
    /// recompute, store, and return it.
    ///
    /// `modified` reports the latest modification time of the key's inputs;
    /// an entry is fresh iff that time is not later than the entry's
    /// computation time. Errors from either probe propagate and leave the
    /// cache unchanged.
    pub fn get_or_compute<E>(
        &self,
        key: K,
        modified: impl FnOnce() -> Result<SystemTime, E>,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entry) = inner.entries.get(&key) {
            if modified()? <= entry.computed_at {
                return Ok(entry.value.clone());
            }
        }
        let value = compute()?;
        inner.insert(key, Entry { computed_at: SystemTime::now(), value: value.clone() });
        if let Some(max) = self.max_entries {
            inner.evict_to(max);
        }
        Ok(value)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn purge(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.entries.clear();
        inner.order.clear();
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for ModifiedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn insert(&mut self, key: K, entry: Entry<V>) {
        self.entries.insert(key, entry);
        self.resort();
    }

    /// Recompute the oldest-first key order from computation times.
    fn resort(&mut self) {
        let mut keyed: Vec<(SystemTime, K)> =
            self.entries.iter().map(|(key, entry)| (entry.computed_at, key.clone())).collect();
        keyed.sort_by_key(|(at, _)| *at);
        self.order = keyed.into_iter().map(|(_, key)| key).collect();
    }

    fn evict_to(&mut self, max: usize) {
        while self.entries.len() > max && !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.entries.remove(&oldest);
        }
    }
}
