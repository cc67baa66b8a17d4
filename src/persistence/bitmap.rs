//! Bitmap persister
//!
//! The in-memory LRU tier specialized for bitmaps: entries are weighed by
//! their pixel footprint and the capacity comes from the `CapacityPlanner`.

use std::borrow::Borrow;
use std::sync::Arc;

use tracing::info;

use crate::cache::{CapacityPlanner, MemoryClassReporter, Weigher};
use crate::config::Config;
use crate::error::Result;
use crate::models::Bitmap;
use crate::persistence::InMemoryLruPersister;

/// Weighs a bitmap by `row_bytes * height`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapWeigher;

impl<K, B> Weigher<K, B> for BitmapWeigher
where
    B: Borrow<Bitmap>,
{
    fn weigh(&self, _key: &K, value: &B) -> u64 {
        value.borrow().byte_count()
    }
}

/// Memory tier for bitmaps. Cached bitmaps are shared, not copied.
pub type InMemoryBitmapPersister = InMemoryLruPersister<Arc<Bitmap>, BitmapWeigher>;

impl InMemoryLruPersister<Arc<Bitmap>, BitmapWeigher> {
    /// Creates a bitmap persister whose capacity is planned once, here.
    ///
    /// A positive `cache_size` is used as is; otherwise the capacity scales
    /// with the memory class the reporter gives for this process.
    ///
    /// # Errors
    /// Returns `CacheError::Configuration` if the capacity has to be derived
    /// and the reporter cannot provide a memory class.
    pub fn planned<R>(reporter: &R, cache_size: Option<u64>) -> Result<Self>
    where
        R: MemoryClassReporter + ?Sized,
    {
        let capacity = CapacityPlanner::new().plan(cache_size, reporter)?;
        info!("Bitmap cache sized to {} bytes", capacity);
        Ok(Self::new(capacity, BitmapWeigher))
    }

    /// Creates a bitmap persister from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::planned(config, config.explicit_capacity_bytes)
    }
}
