//! Persistence Module
//!
//! Object persisters addressed by string keys, chained through an optional
//! fallback consulted on a miss.
//!
//! # Persisters
//! - `InMemoryLruPersister`: size-bounded LRU tier over any payload
//! - `InMemoryBitmapPersister`: the LRU tier for bitmaps, sized from host memory

mod bitmap;
mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use bitmap::{BitmapWeigher, InMemoryBitmapPersister};
pub use memory::InMemoryLruPersister;

// == Object Persister ==
/// A keyed store of objects of type `T`.
///
/// `max_age` bounds how old stored data may be to count as present; `None`
/// accepts data of any age.
#[async_trait]
pub trait ObjectPersister<T: Send + 'static>: Send + Sync {
    /// Loads the data stored under `key`, if present and fresh enough.
    async fn load(&self, key: &str, max_age: Option<Duration>) -> Result<Option<T>>;

    /// Stores `data` under `key` and hands it back.
    async fn save(&self, key: &str, data: T) -> Result<T>;

    /// Returns true if fresh data is stored under `key`.
    async fn exists(&self, key: &str, max_age: Option<Duration>) -> Result<bool>;

    /// Removes the data under `key`. Returns true if anything was removed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Removes everything.
    async fn remove_all(&self) -> Result<()>;

    /// All stored keys.
    async fn keys(&self) -> Result<Vec<String>>;

    /// All stored data that is fresh enough.
    async fn load_all(&self, max_age: Option<Duration>) -> Result<Vec<T>>;

    /// Creation time of the data under `key`, in Unix milliseconds.
    async fn creation_time(&self, key: &str) -> Result<Option<u64>>;
}
