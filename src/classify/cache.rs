//! In-memory LRU cache of classifier routes with TTL.
//! Key: blake3 hash of (model id | lowercased, whitespace-collapsed query).

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::Route;

struct CacheEntry {
    route: Route,
    inserted_at: Instant,
}

pub struct ClassificationCache {
    inner: Mutex<LruCache<[u8; 32], CacheEntry>>,
    ttl: Duration,
}

impl ClassificationCache {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))),
            ttl,
        }
    }

    pub fn compute_key(model_id: &str, query: &str) -> [u8; 32] {
        let folded = query
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let mut hasher = blake3::Hasher::new();
        hasher.update(model_id.as_bytes());
        hasher.update(b"|");
        hasher.update(folded.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Cached route, or None if absent or expired.
    pub fn get(&self, key: &[u8; 32]) -> Option<Route> {
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.route.clone());
            }
            cache.pop(key);
        }
        None
    }

    pub fn insert(&self, key: [u8; 32], route: Route) {
        self.inner.lock().put(
            key,
            CacheEntry {
                route,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_folds_case_and_whitespace_but_not_model() {
        let a = ClassificationCache::compute_key("m1", "Protein in  Tofu");
        let b = ClassificationCache::compute_key("m1", " protein in tofu ");
        let c = ClassificationCache::compute_key("m2", "protein in tofu");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ClassificationCache::new(1, Duration::from_secs(60));
        let k1 = ClassificationCache::compute_key("m", "one");
        let k2 = ClassificationCache::compute_key("m", "two");
        cache.insert(k1, Route::unknown());
        cache.insert(k2, Route::unknown());
        assert!(cache.get(&k1).is_none());
        assert!(cache.get(&k2).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = ClassificationCache::new(4, Duration::ZERO);
        let key = ClassificationCache::compute_key("m", "q");
        cache.insert(key, Route::unknown());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }
}
