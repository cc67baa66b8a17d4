//! Error types for the bitmap cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its persisters.
///
/// A lookup miss is not an error: loads return `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The host memory-class reporter is unavailable, so no capacity can be planned
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A persister in the chain failed to load, save or remove data
    #[error("Persistence error: {0}")]
    Persistence(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
