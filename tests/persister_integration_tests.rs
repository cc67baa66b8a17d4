//! Integration Tests for the bitmap persister chain
//!
//! Exercises the memory tier together with a slow fallback tier under
//! concurrent callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitmap_cache::cache::{current_timestamp_ms, FixedMemoryClass};
use bitmap_cache::models::PixelFormat;
use bitmap_cache::{
    Bitmap, CacheError, Config, InMemoryBitmapPersister, ObjectPersister, Result,
};
use tokio::sync::Mutex;

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitmap_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn bitmap(side: u32) -> Arc<Bitmap> {
    Arc::new(Bitmap::new(side, side, PixelFormat::Argb8888).unwrap())
}

/// Fallback tier that takes a while to answer, like a disk or network store.
#[derive(Default)]
struct SlowStore {
    data: Mutex<HashMap<String, (Arc<Bitmap>, u64)>>,
    loads: AtomicUsize,
    delay: Duration,
}

impl SlowStore {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }
}

#[async_trait]
impl ObjectPersister<Arc<Bitmap>> for SlowStore {
    async fn load(&self, key: &str, _max_age: Option<Duration>) -> Result<Option<Arc<Bitmap>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let found = self.data.lock().await.get(key).map(|(b, _)| b.clone());
        tokio::time::sleep(self.delay).await;
        Ok(found)
    }

    async fn save(&self, key: &str, data: Arc<Bitmap>) -> Result<Arc<Bitmap>> {
        self.data
            .lock()
            .await
            .insert(key.to_string(), (data.clone(), current_timestamp_ms()));
        Ok(data)
    }

    async fn exists(&self, key: &str, _max_age: Option<Duration>) -> Result<bool> {
        Ok(self.data.lock().await.contains_key(key))
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.data.lock().await.remove(key).is_some())
    }

    async fn remove_all(&self) -> Result<()> {
        self.data.lock().await.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.lock().await.keys().cloned().collect())
    }

    async fn load_all(&self, _max_age: Option<Duration>) -> Result<Vec<Arc<Bitmap>>> {
        Ok(self.data.lock().await.values().map(|(b, _)| b.clone()).collect())
    }

    async fn creation_time(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.data.lock().await.get(key).map(|(_, t)| *t))
    }
}

// == Capacity Planning ==

#[tokio::test]
async fn test_explicit_capacity_ignores_memory_class() {
    init_tracing();
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(512), Some(1000)).unwrap();
    assert_eq!(persister.capacity().await, 1000);
}

#[tokio::test]
async fn test_capacity_doubles_with_memory_class() {
    init_tracing();
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(32), None).unwrap();
    assert_eq!(persister.capacity().await, 2 * 4 * 1024 * 1024);
}

#[test]
fn test_missing_memory_class_is_configuration_error() {
    let config = Config {
        explicit_capacity_bytes: Some(0),
        memory_class_mb: None,
    };
    let result = InMemoryBitmapPersister::from_config(&config);
    assert!(matches!(result, Err(CacheError::Configuration(_))));
}

// == Eviction ==

#[tokio::test]
async fn test_ten_byte_scenario() {
    init_tracing();
    // 2x2 ALPHA_8 bitmaps weigh 4 bytes each
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(16), Some(10)).unwrap();
    for key in ["A", "B", "C"] {
        let bitmap = Arc::new(Bitmap::new(2, 2, PixelFormat::Alpha8).unwrap());
        persister.save(key, bitmap).await.unwrap();
    }

    let stats = persister.stats().await;
    assert_eq!(stats.occupied_bytes, 8);
    assert_eq!(persister.keys().await.unwrap(), vec!["C", "B"]);
}

#[tokio::test]
async fn test_oversized_bitmap_is_not_cached() {
    init_tracing();
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(16), Some(1024)).unwrap();

    // 32 * 4 * 32 = 4096 bytes
    persister.save("big", bitmap(32)).await.unwrap();

    assert!(persister.load("big", None).await.unwrap().is_none());
    assert_eq!(persister.stats().await.occupied_bytes, 0);
}

// == Fallback Chain ==

#[tokio::test]
async fn test_fallback_backfills_memory_tier() {
    init_tracing();
    let store = SlowStore::new(Duration::from_millis(10));
    store.save("k", bitmap(4)).await.unwrap();

    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None)
        .unwrap()
        .with_fallback(store.clone());

    assert!(persister.load("k", None).await.unwrap().is_some());
    assert!(persister.is_cached("k").await);
    assert!(persister.load("k", None).await.unwrap().is_some());
    assert_eq!(store.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_fallback_does_not_block_cached_reads() {
    init_tracing();
    let store = SlowStore::new(Duration::from_millis(500));
    store.save("slow", bitmap(4)).await.unwrap();

    let persister = Arc::new(
        InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None)
            .unwrap()
            .with_fallback(store.clone()),
    );
    persister.save("fast", bitmap(4)).await.unwrap();

    let slow = {
        let persister = persister.clone();
        tokio::spawn(async move { persister.load("slow", None).await })
    };
    // Let the slow load reach the fallback
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = tokio::time::timeout(Duration::from_millis(200), persister.load("fast", None))
        .await
        .expect("cached read blocked behind fallback fetch")
        .unwrap();
    assert!(fast.is_some());

    assert!(slow.await.unwrap().unwrap().is_some());
}

#[tokio::test]
async fn test_remove_during_fallback_load_stays_removed() {
    init_tracing();
    let store = SlowStore::new(Duration::from_millis(100));
    store.save("k", bitmap(4)).await.unwrap();

    let persister = Arc::new(
        InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None)
            .unwrap()
            .with_fallback(store.clone()),
    );

    let load = {
        let persister = persister.clone();
        tokio::spawn(async move { persister.load("k", None).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(persister.remove("k").await.unwrap());

    assert!(load.await.unwrap().unwrap().is_some());
    assert!(!persister.is_cached("k").await);
    assert!(persister.load("k", None).await.unwrap().is_none());
    assert_eq!(persister.stats().await.occupied_bytes, 0);
}

#[tokio::test]
async fn test_save_during_fallback_load_wins() {
    init_tracing();
    let store = SlowStore::new(Duration::from_millis(100));
    let v1 = bitmap(4);
    let v2 = bitmap(8);
    store.save("k", v1.clone()).await.unwrap();

    let persister = Arc::new(
        InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None)
            .unwrap()
            .with_fallback(store.clone()),
    );

    let load = {
        let persister = persister.clone();
        tokio::spawn(async move { persister.load("k", None).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    persister.save("k", v2.clone()).await.unwrap();

    let loaded = load.await.unwrap().unwrap().unwrap();
    assert!(Arc::ptr_eq(&loaded, &v1));

    let cached = persister.load("k", None).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&cached, &v2));
    assert_eq!(persister.stats().await.occupied_bytes, v2.byte_count());
    assert_eq!(store.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_saves_respect_capacity() {
    init_tracing();
    // 16x16 ARGB bitmaps weigh 1024 bytes; room for 8
    let persister = Arc::new(
        InMemoryBitmapPersister::planned(&FixedMemoryClass(16), Some(8 * 1024)).unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..64 {
        let persister = persister.clone();
        handles.push(tokio::spawn(async move {
            persister.save(&format!("bitmap-{}", i), bitmap(16)).await.unwrap();
            persister.load(&format!("bitmap-{}", i / 2), None).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = persister.stats().await;
    assert!(stats.occupied_bytes <= 8 * 1024);
    assert_eq!(stats.occupied_bytes, stats.total_entries as u64 * 1024);
    assert_eq!(stats.total_entries, 8);
    assert_eq!(stats.evictions, 56);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    init_tracing();
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None).unwrap();
    persister.save("k", bitmap(4)).await.unwrap();
    let before = persister.stats().await.occupied_bytes;

    assert!(!persister.remove("absent").await.unwrap());
    assert_eq!(persister.stats().await.occupied_bytes, before);

    assert!(persister.remove("k").await.unwrap());
    assert!(!persister.remove("k").await.unwrap());
    assert_eq!(persister.stats().await.occupied_bytes, 0);
}

#[tokio::test]
async fn test_max_age_expires_cached_bitmap() {
    init_tracing();
    let persister = InMemoryBitmapPersister::planned(&FixedMemoryClass(16), None).unwrap();
    persister.save("k", bitmap(4)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(persister
        .load("k", Some(Duration::from_millis(5)))
        .await
        .unwrap()
        .is_none());
    assert!(persister
        .load("k", Some(Duration::from_secs(60)))
        .await
        .unwrap()
        .is_some());
}
