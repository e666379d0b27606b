use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, KeyCache};
use crate::error::KeyStoreError;
use crate::fetch::HttpFetch;
use crate::jwks::{JoseParser, Key, KeyQuery, KeySet};

/// Resolves and caches the key set published at an issuer's `jwks_uri`.
///
/// Lookups are served from the injected [`KeyCache`]; a fetch happens only
/// when nothing fresh is cached, when a lookup cannot be satisfied from the
/// cached set, or when the caller forces one. Staleness is inferred from
/// lookup misses rather than elapsed time: providers rotate keys out of
/// band, and a requested key missing from the cached set is the one reliable
/// signal a client gets. Each lookup refetches at most once, so a provider
/// that never publishes the requested key yields
/// [`KeyStoreError::KeyNotFound`] instead of a refetch loop.
pub struct IssuerKeyStore {
    jwks_uri: Option<String>,
    http: Arc<dyn HttpFetch>,
    parser: Arc<dyn JoseParser>,
    cache: Arc<dyn KeyCache>,
    refresh_lock: Mutex<()>,
}

impl IssuerKeyStore {
    /// Create a store for the given JWKS endpoint with injected
    /// collaborators.
    pub fn new(
        jwks_uri: Option<String>,
        http: Arc<dyn HttpFetch>,
        parser: Arc<dyn JoseParser>,
        cache: Arc<dyn KeyCache>,
    ) -> Self {
        Self {
            jwks_uri,
            http,
            parser,
            cache,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Return the current key set, fetching it if nothing fresh is cached or
    /// if `force_refetch` is set.
    ///
    /// A forced refetch performs exactly one fetch regardless of cache
    /// state. A failed fetch leaves any previously cached set in place and
    /// surfaces the error.
    pub async fn keystore(&self, force_refetch: bool) -> Result<Arc<KeySet>, KeyStoreError> {
        let jwks_uri = self.jwks_uri()?;

        if force_refetch {
            let _guard = self.refresh_lock.lock().await;
            return self.fetch_and_store(jwks_uri).await;
        }

        if let Some(entry) = self.cache.get(jwks_uri) {
            return Ok(entry.keys);
        }

        let _guard = self.refresh_lock.lock().await;
        // A concurrent caller may have refreshed while we waited for the lock.
        if let Some(entry) = self.cache.get(jwks_uri) {
            return Ok(entry.keys);
        }
        self.fetch_and_store(jwks_uri).await
    }

    /// Resolve exactly one key satisfying `query`.
    ///
    /// When the cached set has no match it is treated as stale: the set is
    /// refetched once and the query retried against the new generation. More
    /// than one match without a `kid` in the query fails with
    /// [`KeyStoreError::AmbiguousKey`] rather than guessing.
    pub async fn key(&self, query: &KeyQuery) -> Result<Key, KeyStoreError> {
        let jwks_uri = self.jwks_uri()?;

        let (keys, fetched) = match self.cache.get(jwks_uri) {
            Some(entry) => (entry.keys, false),
            None => (self.keystore(false).await?, true),
        };

        match select_key(&keys, query) {
            Err(KeyStoreError::KeyNotFound) if !fetched => {
                debug!(jwks_uri, "Cached key set has no match, refetching");
                let keys = self.keystore(true).await?;
                select_key(&keys, query)
            }
            result => result,
        }
    }

    /// Drop the cached key set so the next lookup fetches a fresh one.
    pub fn invalidate(&self) {
        if let Some(jwks_uri) = self.jwks_uri.as_deref() {
            self.cache.delete(jwks_uri);
        }
    }

    async fn fetch_and_store(&self, jwks_uri: &str) -> Result<Arc<KeySet>, KeyStoreError> {
        debug!(jwks_uri, "Fetching JWKS document");
        let response = self.http.get(jwks_uri).await.map_err(|err| {
            warn!(jwks_uri, error = %err, "JWKS fetch failed");
            err
        })?;
        if response.status != 200 {
            warn!(
                jwks_uri,
                status = response.status,
                "JWKS fetch returned an error status"
            );
            return Err(KeyStoreError::RemoteFetch(format!(
                "expected 200 OK from jwks_uri, got {}",
                response.status
            )));
        }
        let keys = self.parser.parse(&response.body).map_err(|err| {
            warn!(jwks_uri, error = %err, "JWKS parse failed");
            err
        })?;
        let keys = Arc::new(keys);
        self.cache.set(jwks_uri, CacheEntry::new(keys.clone()));
        debug!(jwks_uri, key_count = keys.len(), "Cached fresh key set");
        Ok(keys)
    }

    fn jwks_uri(&self) -> Result<&str, KeyStoreError> {
        self.jwks_uri
            .as_deref()
            .ok_or_else(|| KeyStoreError::Configuration("jwks_uri must be configured".into()))
    }
}

/// Select exactly one key from `keys`: filter by the query, collapse
/// duplicate `(kid, alg)` pairs keeping the first occurrence, then require a
/// single candidate unless the query's `kid` already pins the choice to the
/// first match in document order.
fn select_key(keys: &KeySet, query: &KeyQuery) -> Result<Key, KeyStoreError> {
    let mut seen: Vec<(Option<&str>, Option<&str>)> = Vec::new();
    let mut candidates: Vec<&Key> = Vec::new();
    for key in keys.iter().filter(|key| key.matches(query)) {
        let identity = (key.kid.as_deref(), key.alg.as_deref());
        if seen.contains(&identity) {
            continue;
        }
        seen.push(identity);
        candidates.push(key);
    }
    match candidates.as_slice() {
        [] => Err(KeyStoreError::KeyNotFound),
        [key] => Ok((*key).clone()),
        [first, ..] if query.kid.is_some() => Ok((*first).clone()),
        _ => Err(KeyStoreError::AmbiguousKey),
    }
}
