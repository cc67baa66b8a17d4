//! Weigher Module
//!
//! Assigns a size to each cache entry. The cache keeps the sum of all entry
//! sizes within its capacity, so the weigher decides what capacity means:
//! bytes for bitmaps, entry count for `UnitWeigher`.

/// Computes the size of a cache entry.
///
/// The size is taken once, on insertion, and never recomputed.
pub trait Weigher<K, V> {
    fn weigh(&self, key: &K, value: &V) -> u64;
}

/// Every entry costs exactly 1, turning the cache into an entry-count LRU.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeigher;

impl<K, V> Weigher<K, V> for UnitWeigher {
    #[inline]
    fn weigh(&self, _key: &K, _value: &V) -> u64 {
        1
    }
}

impl<K, V, F> Weigher<K, V> for F
where
    F: Fn(&K, &V) -> u64,
{
    #[inline]
    fn weigh(&self, key: &K, value: &V) -> u64 {
        self(key, value)
    }
}
