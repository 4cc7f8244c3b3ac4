//! TTL cache with lazy expiry and LRU eviction.
//!
//! One instance per namespace (market quotes, fund NAVs), each with its
//! own capacity and default TTL. Expiry is checked on read: an entry
//! past its TTL is removed and reported as a miss. Eviction runs only
//! when inserting a new key at capacity and removes the entry with the
//! oldest `last_access`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
    last_access: Instant,
}

/// Thread-safe TTL cache over string keys.
pub struct TtlCache<V> {
    /// Namespace for log lines.
    name: &'static str,
    capacity: usize,
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(name: &'static str, capacity: usize, default_ttl: Duration) -> Self {
        Self {
            name,
            capacity,
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    ///
    /// A poisoned cache at worst serves a stale or missing entry,
    /// which the tier ladder already tolerates.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Cache '{}' mutex was poisoned, recovering", self.name);
            poisoned.into_inner()
        })
    }

    /// Look up `key`, expiring it lazily.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock_entries();

        let expired = match entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() >= entry.ttl,
            None => return None,
        };

        if expired {
            entries.remove(key);
            debug!("Cache '{}': entry for '{}' expired", self.name, key);
            return None;
        }

        entries.get_mut(key).map(|entry| {
            entry.last_access = Instant::now();
            entry.value.clone()
        })
    }

    /// Insert with the cache's default TTL.
    pub fn insert(&self, key: &str, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert with a per-entry TTL.
    ///
    /// When the cache is at capacity and `key` is new, the
    /// least-recently-accessed entry is evicted first.
    pub fn insert_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let mut entries = self.lock_entries();

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let evicted = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone());
            if let Some(evicted) = evicted {
                debug!(
                    "Cache '{}': at capacity {}, evicting '{}'",
                    self.name, self.capacity, evicted
                );
                entries.remove(&evicted);
            }
        }

        let now = Instant::now();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: now,
                ttl,
                last_access: now,
            },
        );
    }

    /// Drop `key`. Returns whether an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        self.lock_entries().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        cache.insert("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        cache.insert_with_ttl("a", 1, Duration::from_millis(20));
        assert_eq!(cache.get("a"), Some(1));

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        cache.insert_with_ttl("a", 1, Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let cache: TtlCache<u32> = TtlCache::new("test", 3, TTL);
        for i in 0..10 {
            cache.insert(&format!("key-{i}"), i);
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn test_eviction_prefers_least_recently_accessed() {
        let cache: TtlCache<u32> = TtlCache::new("test", 2, TTL);
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b", 2);
        std::thread::sleep(Duration::from_millis(5));

        // Touch "a" so "b" becomes the coldest entry.
        assert_eq!(cache.get("a"), Some(1));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache: TtlCache<u32> = TtlCache::new("test", 2, TTL);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        cache.insert_with_ttl("a", 1, Duration::from_millis(30));
        std::thread::sleep(Duration::from_millis(20));
        cache.insert_with_ttl("a", 2, Duration::from_millis(30));
        std::thread::sleep(Duration::from_millis(20));

        // 40ms after the first insert, but only 20ms after the second.
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_remove() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        cache.insert("a", 1);
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_is_empty() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, TTL);
        assert!(cache.is_empty());
        cache.insert("a", 1);
        assert!(!cache.is_empty());
    }
}
