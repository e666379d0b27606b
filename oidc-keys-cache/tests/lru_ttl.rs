use std::num::NonZeroUsize;
use std::thread::sleep;
use std::time::Duration;

use oidc_keys_cache::LruTtlCache;

fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_cache_hit() {
    let cache = LruTtlCache::new(cap(8), Duration::from_secs(60));
    cache.insert("key", "value");
    assert_eq!(cache.get("key"), Some("value"));
}

#[test]
fn test_cache_miss() {
    let cache: LruTtlCache<&str, &str> = LruTtlCache::new(cap(8), Duration::from_secs(60));
    assert_eq!(cache.get("missing"), None);
}

#[test]
fn test_cache_expiry() {
    let cache = LruTtlCache::new(cap(8), Duration::from_millis(50));
    cache.insert("key", "value");
    sleep(Duration::from_millis(60));
    assert_eq!(cache.get("key"), None);
    // The expired entry was evicted by the read, not just hidden.
    assert!(cache.is_empty());
}

#[test]
fn test_cache_remove() {
    let cache = LruTtlCache::new(cap(8), Duration::from_secs(60));
    cache.insert("key", "value");
    cache.remove("key");
    assert_eq!(cache.get("key"), None);
}

#[test]
fn test_cache_clear() {
    let cache = LruTtlCache::new(cap(8), Duration::from_secs(60));
    cache.insert("a", 1);
    cache.insert("b", 2);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get("a"), None);
}

#[test]
fn test_insert_replaces_existing() {
    let cache = LruTtlCache::new(cap(8), Duration::from_secs(60));
    cache.insert("key", 1);
    cache.insert("key", 2);
    assert_eq!(cache.get("key"), Some(2));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lru_eviction_at_capacity() {
    let cache = LruTtlCache::new(cap(2), Duration::from_secs(60));
    cache.insert("a", 1);
    cache.insert("b", 2);
    cache.insert("c", 3);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
}

#[test]
fn test_get_refreshes_recency() {
    let cache = LruTtlCache::new(cap(2), Duration::from_secs(60));
    cache.insert("a", 1);
    cache.insert("b", 2);
    // Touch "a" so "b" becomes the eviction candidate.
    assert_eq!(cache.get("a"), Some(1));
    cache.insert("c", 3);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("b"), None);
    assert_eq!(cache.get("c"), Some(3));
}

#[test]
fn test_clones_share_storage() {
    let cache = LruTtlCache::new(cap(8), Duration::from_secs(60));
    let clone = cache.clone();
    clone.insert("key", "value");
    assert_eq!(cache.get("key"), Some("value"));
}

#[test]
fn test_evict_expired() {
    let cache = LruTtlCache::new(cap(8), Duration::from_millis(50));
    cache.insert("old", 1);
    sleep(Duration::from_millis(60));
    cache.insert("fresh", 2);
    cache.evict_expired();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("old"), None);
    assert_eq!(cache.get("fresh"), Some(2));
}

#[test]
fn test_len_and_capacity() {
    let cache: LruTtlCache<String, u32> = LruTtlCache::new(cap(4), Duration::from_secs(60));
    assert!(cache.is_empty());
    cache.insert("a".to_string(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.capacity(), cap(4));
}
