//! Sized LRU Cache Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, bounded by
//! the total size of its entries rather than their count.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheStats, LruTracker, UnitWeigher, Weigher};

// == Sized LRU Cache ==
/// Least-recently-used cache bounded by the summed size of its entries.
///
/// Each entry is sized once by the weigher `W` when it is inserted. After
/// every public operation the running total equals the sum of those sizes
/// and does not exceed the capacity.
///
/// The cache is not synchronized; share it behind a single lock.
#[derive(Debug)]
pub struct SizedLruCache<K, V, W = UnitWeigher> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Per-entry size function
    weigher: W,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum running total
    capacity: u64,
    /// Running total of entry sizes
    occupied: u64,
    /// Monotonic access counter
    tick: u64,
}

impl<K, V> SizedLruCache<K, V, UnitWeigher>
where
    K: Hash + Eq + Clone + Debug,
{
    /// Creates an entry-count LRU holding at most `capacity` entries.
    pub fn with_entry_capacity(capacity: u64) -> Self {
        Self::new(capacity, UnitWeigher)
    }
}

impl<K, V, W> SizedLruCache<K, V, W>
where
    K: Hash + Eq + Clone + Debug,
    W: Weigher<K, V>,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum total size of all entries, in weigher units
    /// * `weigher` - Computes the size of each inserted entry
    pub fn new(capacity: u64, weigher: W) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            weigher,
            stats: CacheStats::new(capacity),
            capacity,
            occupied: 0,
            tick: 0,
        }
    }

    // == Get ==
    /// Retrieves a value and promotes it to most recently used.
    ///
    /// A miss leaves the recency order untouched.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_entry(key).map(|entry| &entry.value)
    }

    // == Get Entry ==
    /// Like `get`, but exposes the entry metadata as well.
    pub fn get_entry(&mut self, key: &K) -> Option<&CacheEntry<V>> {
        self.get_entry_if(key, |_| true)
    }

    // == Get Entry If ==
    /// Retrieves an entry only if `accept` approves it.
    ///
    /// An accepted entry is promoted and counted as a hit. A rejected or
    /// absent entry counts as a miss and keeps its place in the recency order.
    pub fn get_entry_if<F>(&mut self, key: &K, accept: F) -> Option<&CacheEntry<V>>
    where
        F: FnOnce(&CacheEntry<V>) -> bool,
    {
        if !self.entries.get(key).is_some_and(accept) {
            self.stats.record_miss();
            trace!(?key, "cache miss");
            return None;
        }

        let tick = self.next_tick();
        self.lru.touch(key);
        self.stats.record_hit();
        trace!(?key, "cache hit");
        let entry = self.entries.get_mut(key)?;
        entry.last_access = tick;
        Some(&*entry)
    }

    // == Peek ==
    /// Retrieves an entry without touching recency or statistics.
    pub fn peek_entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Put ==
    /// Inserts or replaces a value, evicting least recently used entries
    /// until it fits within the capacity.
    ///
    /// The new entry is the most recently used one, so every other entry is
    /// evicted before it. An entry larger than the whole capacity therefore
    /// empties the cache and is evicted itself.
    ///
    /// Returns true if the value is resident after the call.
    pub fn put(&mut self, key: K, value: V) -> bool {
        let size = self.weigher.weigh(&key, &value);

        if let Some(old) = self.entries.remove(&key) {
            self.lru.remove(&key);
            self.occupied -= old.size;
        }

        if size > self.capacity {
            warn!(
                ?key,
                size,
                capacity = self.capacity,
                "entry larger than cache capacity, it will not be retained"
            );
            while self.evict_oldest() {}
            self.stats.record_eviction();
            self.sync_stats();
            return false;
        }

        // occupied + size <= capacity once this loop ends
        while self.occupied > self.capacity - size {
            if !self.evict_oldest() {
                break;
            }
        }

        let tick = self.next_tick();
        self.entries
            .insert(key.clone(), CacheEntry::new(value, size, tick));
        self.occupied += size;
        self.lru.touch(&key);

        self.sync_stats();
        true
    }

    // == Remove ==
    /// Removes an entry, returning its value. No-op for an absent key.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.occupied -= entry.size;
        self.sync_stats();
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.occupied = 0;
        self.sync_stats();
    }

    // == Evict ==
    /// Evicts the least recently used entry. Returns false if the cache is empty.
    fn evict_oldest(&mut self) -> bool {
        let Some(oldest) = self.lru.evict_oldest() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&oldest) {
            self.occupied -= entry.size;
            self.stats.record_eviction();
            debug!(key = ?oldest, size = entry.size, "evicted least recently used entry");
        }
        true
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn sync_stats(&mut self) {
        self.stats.set_occupancy(self.entries.len(), self.occupied);
    }

    // == Accessors ==
    /// Returns true if the key is cached. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.lru.iter().cloned().collect()
    }

    /// Maximum running total.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Current running total of entry sizes.
    pub fn occupied(&self) -> u64 {
        self.occupied
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Panics if the running total, the recency order and the entries disagree.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let sum: u64 = self.entries.values().map(|e| e.size).sum();
        assert_eq!(self.occupied, sum, "running total diverged from entry sizes");
        assert!(self.occupied <= self.capacity, "running total exceeds capacity");
        assert_eq!(self.lru.len(), self.entries.len(), "recency order out of sync");
        assert!(self.lru.iter().all(|k| self.entries.contains_key(k)));
    }
}
