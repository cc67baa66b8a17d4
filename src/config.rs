//! Configuration Module
//!
//! Handles loading cache sizing options from environment variables.

use std::env;

use crate::cache::MemoryClassReporter;

/// Cache construction parameters.
///
/// All values can be configured via environment variables. Both are optional:
/// an unset override means "plan from the memory class", and an unset memory
/// class means the host cannot report one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Explicit cache capacity in bytes; only honored when greater than zero
    pub explicit_capacity_bytes: Option<u64>,
    /// Per-process memory allotment reported by the host, in MiB
    pub memory_class_mb: Option<u32>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SIZE_BYTES` - Explicit capacity override (default: unset)
    /// - `MEMORY_CLASS_MB` - Host memory class in MiB (default: unset)
    pub fn from_env() -> Self {
        Self {
            explicit_capacity_bytes: env::var("CACHE_SIZE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            memory_class_mb: env::var("MEMORY_CLASS_MB")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Sets the explicit capacity override.
    pub fn with_capacity_bytes(mut self, bytes: u64) -> Self {
        self.explicit_capacity_bytes = Some(bytes);
        self
    }

    /// Sets the reported memory class.
    pub fn with_memory_class_mb(mut self, mb: u32) -> Self {
        self.memory_class_mb = Some(mb);
        self
    }
}

impl MemoryClassReporter for Config {
    fn memory_class_mb(&self) -> Option<u32> {
        self.memory_class_mb
    }
}
