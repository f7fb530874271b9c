/*!
# LRU Cache

A bounded least-recently-used cache with O(capacity) touch cost, used
for synthetic class placeholders. Capacities in this engine are small
(hundreds of entries), so a scan-based recency queue beats the pointer
juggling of an intrusive list.

`get_or_insert_with` gives compute-if-absent semantics: a key is
computed once and every later request returns the cached value.
*/

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Hit/miss counters of a cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub gets: u64,
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// The share of `get` operations that hit, in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }
}

/// An LRU cache with a fixed capacity.
pub struct LruCache<K: Eq + Hash + Clone, V: Clone> {
    map: HashMap<K, V>,
    /// Recency queue; the front is the most recently used key.
    order: VecDeque<K>,
    capacity: usize,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Creates a cache holding at most `capacity` entries.
    /// A zero capacity is promoted to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Returns the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.stats.gets += 1;
        if let Some(value) = self.map.get(key).cloned() {
            self.stats.hits += 1;
            self.touch(key);
            Some(value)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Inserts or updates the value for `key`, evicting the least
    /// recently used entry when over capacity.
    pub fn put(&mut self, key: K, value: V) {
        self.stats.puts += 1;
        if self.map.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_front(key);
        if self.map.len() > self.capacity {
            if let Some(evicted) = self.order.pop_back() {
                self.map.remove(&evicted);
                self.stats.evictions += 1;
            }
        }
    }

    /// Returns the value for `key`, computing and caching it on a miss.
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.put(key, value.clone());
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn touch(&mut self, key: &K) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            if let Some(touched) = self.order.remove(position) {
                self.order.push_front(touched);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&2), Some("two"));
    }

    #[test]
    fn test_eviction_order() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        cache.put(3, "three"); // Evicts 1.

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("two"));
        assert_eq!(cache.get(&3), Some("three"));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        cache.get(&1);
        cache.put(3, "three"); // Evicts 2, not 1.

        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_update_existing_key() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.put(1, "ONE");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Some("ONE"));
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let mut cache = LruCache::new(4);
        let mut computed = 0;
        for _ in 0..3 {
            let value = cache.get_or_insert_with("key", || {
                computed += 1;
                42
            });
            assert_eq!(value, 42);
        }
        assert_eq!(computed, 1);
    }

    #[test]
    fn test_stats() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.get(&1); // hit
        cache.get(&2); // miss
        cache.get(&1); // hit

        let stats = cache.stats();
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.gets, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear() {
        let mut cache = LruCache::new(2);
        cache.put(1, "one");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_zero_capacity_is_promoted() {
        let mut cache = LruCache::new(0);
        cache.put(1, "one");
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get(&1), Some("one"));
    }
}
