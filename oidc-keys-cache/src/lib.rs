use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

/// A thread-safe, bounded LRU cache with a uniform per-entry TTL.
///
/// Inserting into a full cache evicts the least-recently-used entry. Entries
/// older than the TTL are treated as absent and evicted lazily when touched;
/// [`evict_expired`](Self::evict_expired) sweeps them eagerly. Clones are
/// cheap and share the same storage.
#[derive(Clone)]
pub struct LruTtlCache<K, V> {
    inner: Arc<Mutex<LruCache<K, (V, Instant)>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> LruTtlCache<K, V> {
    /// Create a cache holding at most `capacity` entries, each living for `ttl`.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    /// Get a value if it is present and has not expired.
    ///
    /// A hit marks the entry as most recently used. An expired entry is
    /// removed and reported as a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.lock();
        match inner.get(key) {
            Some((value, inserted)) if inserted.elapsed() < self.ttl => {
                return Some(value.clone());
            }
            Some(_) => {}
            None => return None,
        }
        inner.pop(key);
        None
    }

    /// Insert or replace a value, evicting the least-recently-used entry if
    /// the cache is full.
    pub fn insert(&self, key: K, value: V) {
        self.lock().put(key, (value, Instant::now()));
    }

    /// Remove an entry, if present.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().pop(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of entries the cache can hold.
    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    /// Eagerly remove every expired entry.
    pub fn evict_expired(&self) {
        let mut inner = self.lock();
        let expired: Vec<K> = inner
            .iter()
            .filter(|(_, (_, inserted))| inserted.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.pop(key);
        }
    }

    // No operation leaves the map half-updated, so a poisoned lock is
    // recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, LruCache<K, (V, Instant)>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
