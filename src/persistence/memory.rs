//! In-memory LRU persister
//!
//! Wraps a `SizedLruCache` behind a single async mutex and chains it to an
//! optional fallback persister. The lock is never held while the fallback is
//! awaited, so a slow fallback does not block other callers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheStats, SizedLruCache, Weigher};
use crate::error::Result;
use crate::persistence::ObjectPersister;

// == Memory Tier ==
/// Cache state guarded by the persister's mutex.
///
/// Saves and removals bump `epoch`. A key with fallback loads in flight
/// remembers the epoch of its last write, so a fetch that started before
/// that write does not backfill stale data.
struct MemoryTier<T, W> {
    cache: SizedLruCache<String, T, W>,
    epoch: u64,
    /// Keys with fallback loads in flight: (loads, epoch of last write)
    fetching: HashMap<String, (usize, u64)>,
}

impl<T, W> MemoryTier<T, W> {
    /// Registers a fallback load and returns the epoch it started at.
    fn begin_fetch(&mut self, key: &str) -> u64 {
        self.fetching.entry(key.to_string()).or_insert((0, 0)).0 += 1;
        self.epoch
    }

    /// Ends a fallback load. Returns true if `key` was not written since it began.
    fn end_fetch(&mut self, key: &str, started: u64) -> bool {
        let Some((loads, written)) = self.fetching.get_mut(key) else {
            return true;
        };
        let unchanged = *written <= started;
        *loads -= 1;
        if *loads == 0 {
            self.fetching.remove(key);
        }
        unchanged
    }

    fn record_write(&mut self, key: &str) {
        self.epoch += 1;
        if let Some((_, written)) = self.fetching.get_mut(key) {
            *written = self.epoch;
        }
    }

    fn record_clear(&mut self) {
        self.epoch += 1;
        for (_, written) in self.fetching.values_mut() {
            *written = self.epoch;
        }
    }
}

/// Memory tier of a persister chain.
///
/// Loads are answered from the LRU cache first. On a miss, or when the cached
/// entry is older than the requested max age, the fallback is consulted and a
/// hit there is written back into the cache, unless the key was saved or
/// removed while the fallback was being read. Saves and removals go to both
/// tiers.
pub struct InMemoryLruPersister<T: Send + 'static, W> {
    tier: Mutex<MemoryTier<T, W>>,
    fallback: Option<Arc<dyn ObjectPersister<T>>>,
}

impl<T, W> InMemoryLruPersister<T, W>
where
    T: Clone + Send + Sync + 'static,
    W: Weigher<String, T> + Send + 'static,
{
    /// Creates a persister with no fallback.
    ///
    /// # Arguments
    /// * `capacity` - Maximum total size of cached objects, in weigher units
    /// * `weigher` - Computes the size of each cached object
    pub fn new(capacity: u64, weigher: W) -> Self {
        info!("In-memory persister created with capacity {}", capacity);
        Self {
            tier: Mutex::new(MemoryTier {
                cache: SizedLruCache::new(capacity, weigher),
                epoch: 0,
                fetching: HashMap::new(),
            }),
            fallback: None,
        }
    }

    /// Sets the persister consulted when the cache misses.
    pub fn with_fallback(mut self, fallback: Arc<dyn ObjectPersister<T>>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Statistics of the memory tier.
    pub async fn stats(&self) -> CacheStats {
        self.tier.lock().await.cache.stats()
    }

    /// Capacity of the memory tier.
    pub async fn capacity(&self) -> u64 {
        self.tier.lock().await.cache.capacity()
    }

    /// Returns true if `key` is resident in the memory tier, fresh or not.
    pub async fn is_cached(&self, key: &str) -> bool {
        self.tier.lock().await.cache.contains(&key.to_string())
    }
}

#[async_trait]
impl<T, W> ObjectPersister<T> for InMemoryLruPersister<T, W>
where
    T: Clone + Send + Sync + 'static,
    W: Weigher<String, T> + Send + 'static,
{
    async fn load(&self, key: &str, max_age: Option<Duration>) -> Result<Option<T>> {
        let (fallback, started) = {
            let mut tier = self.tier.lock().await;
            let fresh = tier
                .cache
                .get_entry_if(&key.to_string(), |entry| !entry.is_older_than(max_age))
                .map(|entry| entry.value.clone());
            let Some(fallback) = self.fallback.as_ref().filter(|_| fresh.is_none()) else {
                return Ok(fresh);
            };
            (fallback, tier.begin_fetch(key))
        };

        let loaded = fallback.load(key, max_age).await;

        let mut tier = self.tier.lock().await;
        let unchanged = tier.end_fetch(key, started);
        let loaded = loaded?;
        if let Some(data) = &loaded {
            if unchanged {
                let retained = tier.cache.put(key.to_string(), data.clone());
                debug!(key, retained, "backfilled cache from fallback persister");
            } else {
                debug!(key, "key written during fallback load, skipped backfill");
            }
        }
        Ok(loaded)
    }

    async fn save(&self, key: &str, data: T) -> Result<T> {
        {
            let mut tier = self.tier.lock().await;
            tier.cache.put(key.to_string(), data.clone());
            tier.record_write(key);
        }

        match &self.fallback {
            Some(fallback) => fallback.save(key, data).await,
            None => Ok(data),
        }
    }

    async fn exists(&self, key: &str, max_age: Option<Duration>) -> Result<bool> {
        let fresh = {
            let tier = self.tier.lock().await;
            tier.cache
                .peek_entry(&key.to_string())
                .is_some_and(|entry| !entry.is_older_than(max_age))
        };
        if fresh {
            return Ok(true);
        }

        match &self.fallback {
            Some(fallback) => fallback.exists(key, max_age).await,
            None => Ok(false),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let removed = {
            let mut tier = self.tier.lock().await;
            tier.record_write(key);
            tier.cache.remove(&key.to_string()).is_some()
        };

        match &self.fallback {
            Some(fallback) => Ok(fallback.remove(key).await? || removed),
            None => Ok(removed),
        }
    }

    async fn remove_all(&self) -> Result<()> {
        {
            let mut tier = self.tier.lock().await;
            tier.cache.clear();
            tier.record_clear();
        }

        if let Some(fallback) = &self.fallback {
            fallback.remove_all().await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self.tier.lock().await.cache.keys();

        if let Some(fallback) = &self.fallback {
            for key in fallback.keys().await? {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    async fn load_all(&self, max_age: Option<Duration>) -> Result<Vec<T>> {
        let (cached_keys, mut data): (Vec<String>, Vec<T>) = {
            let tier = self.tier.lock().await;
            tier.cache
                .keys()
                .into_iter()
                .filter_map(|key| {
                    let entry = tier.cache.peek_entry(&key)?;
                    (!entry.is_older_than(max_age)).then(|| (key, entry.value.clone()))
                })
                .unzip()
        };

        if let Some(fallback) = &self.fallback {
            for key in fallback.keys().await? {
                if cached_keys.contains(&key) {
                    continue;
                }
                if let Some(value) = fallback.load(&key, max_age).await? {
                    data.push(value);
                }
            }
        }
        Ok(data)
    }

    async fn creation_time(&self, key: &str) -> Result<Option<u64>> {
        let cached = self
            .tier
            .lock()
            .await
            .cache
            .peek_entry(&key.to_string())
            .map(|entry| entry.created_at);
        if cached.is_some() {
            return Ok(cached);
        }

        match &self.fallback {
            Some(fallback) => fallback.creation_time(key).await,
            None => Ok(None),
        }
    }
}
