use crate::core::{LocationEstimate, TowerIdentity};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hit/miss counters of a [`LocationCache`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatistics {
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
}

/// Resolved tower locations, kept for the lifetime of the cache
///
/// Entries are stored without signal strength. There is no expiration:
/// tower positions reported by the geolocation service are treated as fixed.
/// Safe to share between threads; concurrent writes to the same tower keep
/// the last value written.
#[derive(Debug, Default)]
pub struct LocationCache {
    entries: RwLock<HashMap<TowerIdentity, LocationEstimate>>,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached location of `identity`, if any
    pub fn get(&self, identity: &TowerIdentity) -> Option<LocationEstimate> {
        let found = self.entries.read().get(identity).copied();
        match found {
            Some(_) => self.hit_count.fetch_add(1, Ordering::Relaxed),
            None => self.miss_count.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Cached location with the caller's signal strength attached
    pub fn get_with_signal(
        &self,
        identity: &TowerIdentity,
        signal_strength: Option<i32>,
    ) -> Option<LocationEstimate> {
        self.get(identity).map(|loc| loc.with_signal_strength(signal_strength))
    }

    /// Store the location of `identity`, dropping any signal strength
    pub fn put(&self, identity: TowerIdentity, estimate: LocationEstimate) {
        self.entries.write().insert(identity, estimate.stripped());
    }

    pub fn contains(&self, identity: &TowerIdentity) -> bool {
        self.entries.read().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        CacheStatistics { hits, misses, hit_rate }
    }

    /// Drop all entries and reset statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoPoint;
    use std::sync::Arc;
    use std::thread;

    fn sample() -> (TowerIdentity, LocationEstimate) {
        (
            TowerIdentity::new(286, 2, 54110, 51861),
            LocationEstimate::new(GeoPoint::new(40.7018894, 29.8912659), 3243.0),
        )
    }

    #[test]
    fn test_get_put() {
        let cache = LocationCache::new();
        let (identity, estimate) = sample();

        assert!(cache.get(&identity).is_none());
        cache.put(identity, estimate);
        assert_eq!(cache.get(&identity), Some(estimate));

        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_signal_is_stripped_and_reattached() {
        let cache = LocationCache::new();
        let (identity, estimate) = sample();

        cache.put(identity, estimate.with_signal_strength(Some(-82)));
        assert_eq!(cache.get(&identity).unwrap().signal_strength, None);
        assert_eq!(cache.get_with_signal(&identity, Some(-90)).unwrap().signal_strength, Some(-90));
    }

    #[test]
    fn test_concurrent_puts_same_key() {
        let cache = Arc::new(LocationCache::new());
        let (identity, estimate) = sample();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.put(identity, estimate))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&identity), Some(estimate));
    }

    #[test]
    fn test_clear() {
        let cache = LocationCache::new();
        let (identity, estimate) = sample();
        cache.put(identity, estimate);
        cache.get(&identity);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(&identity));
        assert_eq!(cache.statistics().hits, 0);
    }
}
