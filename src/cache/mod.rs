//! Cache Module
//!
//! Provides a size-bounded in-memory LRU cache and the planner deriving its capacity.

mod capacity;
mod entry;
mod lru;
mod stats;
mod store;
mod weigher;


// Re-export public types
pub use capacity::{
    CapacityPlanner, FixedMemoryClass, MemoryClassReporter, BASELINE_MEMORY_CLASS,
    BASE_CACHE_SIZE,
};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::SizedLruCache;
pub use weigher::{UnitWeigher, Weigher};
