use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oidc_keys_cache::LruTtlCache;

use crate::jwks::KeySet;

/// Default maximum number of key sets the bundled cache holds.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default time-to-live for a cached key set.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// One cached generation of an issuer's keys: the parsed set plus the
/// instant it was fetched.
///
/// Entries are created by a successful fetch and replaced wholesale by the
/// next one, never partially updated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The parsed key set. Clones share the same generation.
    pub keys: Arc<KeySet>,
    /// When the set was fetched.
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// Create an entry fetched now.
    pub fn new(keys: Arc<KeySet>) -> Self {
        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }
}

/// Pluggable cache backend for fetched key sets.
///
/// Injected into each [`IssuerKeyStore`](crate::IssuerKeyStore) at
/// construction; there is no process-wide cache. Implement this to swap the
/// bundled in-memory store for a shared or instrumented one, or for a
/// deterministic fake in tests.
pub trait KeyCache: Send + Sync + 'static {
    /// Get the entry stored under `cache_key`, if present and fresh.
    fn get(&self, cache_key: &str) -> Option<CacheEntry>;
    /// Store `entry` under `cache_key`, replacing any previous entry.
    fn set(&self, cache_key: &str, entry: CacheEntry);
    /// Drop the entry stored under `cache_key`, if any.
    fn delete(&self, cache_key: &str);
}

/// Default in-memory [`KeyCache`] backed by a bounded LRU cache with TTL.
///
/// The capacity bound keeps memory flat when many issuers share a process;
/// entries older than the TTL read as absent. Clones share storage, so one
/// instance can back several issuers.
#[derive(Clone)]
pub struct InMemoryKeyCache {
    inner: LruTtlCache<String, CacheEntry>,
}

impl InMemoryKeyCache {
    /// Create a cache holding at most `capacity` key sets for `ttl` each.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner: LruTtlCache::new(capacity, ttl),
        }
    }
}

impl Default for InMemoryKeyCache {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CAPACITY).expect("DEFAULT_CAPACITY is non-zero");
        Self::new(capacity, DEFAULT_TTL)
    }
}

impl KeyCache for InMemoryKeyCache {
    fn get(&self, cache_key: &str) -> Option<CacheEntry> {
        self.inner.get(cache_key)
    }

    fn set(&self, cache_key: &str, entry: CacheEntry) {
        self.inner.insert(cache_key.to_string(), entry);
    }

    fn delete(&self, cache_key: &str) {
        self.inner.remove(cache_key);
    }
}
