//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with size and age metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with its value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Size computed by the weigher at insertion, never recomputed
    pub size: u64,
    /// Access tick of the last get or put; higher is more recent
    pub last_access: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `size` - Size reported by the weigher
    /// * `tick` - Access tick of the inserting put
    pub fn new(value: V, size: u64, tick: u64) -> Self {
        Self {
            value,
            size,
            last_access: tick,
            created_at: current_timestamp_ms(),
        }
    }

    // == Age ==
    /// Returns how long ago the entry was created, in milliseconds.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.created_at)
    }

    // == Is Older Than ==
    /// Checks the entry against a maximum age.
    ///
    /// `None` means the entry never expires. An entry is stale once its age is
    /// strictly greater than `max_age`.
    pub fn is_older_than(&self, max_age: Option<Duration>) -> bool {
        match max_age {
            Some(max_age) => u128::from(self.age_ms()) > max_age.as_millis(),
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
