//! Bitmap Cache - A size-bounded in-memory LRU cache for bitmaps
//!
//! Entries are weighed by their byte footprint, the capacity is planned from
//! the host memory class, and misses fall through to an optional fallback
//! persister whose hits are written back into memory.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;

pub use cache::{CapacityPlanner, MemoryClassReporter, SizedLruCache, Weigher};
pub use config::Config;
pub use error::{CacheError, Result};
pub use models::Bitmap;
pub use persistence::{InMemoryBitmapPersister, InMemoryLruPersister, ObjectPersister};
