//! Generic in-memory key→value store with per-entry expiry.
//!
//! Entries expire `ttl` after insertion and behave as misses from then on.
//! Expired entries are removed lazily when a reader encounters them; a
//! process-wide sweeper (see [`crate::sweep`]) additionally evicts entries
//! nobody reads, so the map does not grow without bound.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// An entry is expired once its full TTL has elapsed, so a zero TTL
    /// expires immediately.
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Thread-safe TTL cache. All methods take `&self`; writes are last-write-wins
/// per key.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Returns the cached value, or `None` on miss or expiry.
    ///
    /// A read that finds an expired entry removes it (lazy eviction). The
    /// removal re-checks expiry under the write lock, so a racing `set` that
    /// refreshed the key is never destroyed. Misses have no side effects.
    pub fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.read_entries();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.write_entries();
        if entries.get(key).is_some_and(|entry| entry.is_expired()) {
            entries.remove(key);
        }
        None
    }

    /// Inserts `value` under `key` with the given TTL, replacing any
    /// previous entry.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.write_entries();
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Removes the entry for `key`, returning whether one was present.
    pub fn delete(&self, key: &K) -> bool {
        self.write_entries().remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.write_entries().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Actively evicts every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }
}
