//! Capacity Planner Module
//!
//! Derives the cache byte budget from an explicit override or from the
//! memory class reported by the host.

use tracing::info;

use crate::error::{CacheError, Result};

// == Constants ==
/// Budget granted to a host reporting the baseline memory class (4 MiB)
pub const BASE_CACHE_SIZE: u64 = 4 * 1024 * 1024;

/// Conservative low-end per-process memory allotment, in MiB
pub const BASELINE_MEMORY_CLASS: u32 = 16;

// == Memory Class Reporter ==
/// Host capability reporting the per-process memory allotment in MiB.
///
/// Returns `None` when the host has no such facility.
pub trait MemoryClassReporter {
    fn memory_class_mb(&self) -> Option<u32>;
}

/// A reporter that always answers with the same memory class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMemoryClass(pub u32);

impl MemoryClassReporter for FixedMemoryClass {
    fn memory_class_mb(&self) -> Option<u32> {
        Some(self.0)
    }
}

// == Capacity Planner ==
/// Computes the capacity of a cache once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlanner {
    base_cache_size: u64,
    baseline_memory_class: u32,
}

impl Default for CapacityPlanner {
    fn default() -> Self {
        Self {
            base_cache_size: BASE_CACHE_SIZE,
            baseline_memory_class: BASELINE_MEMORY_CLASS,
        }
    }
}

impl CapacityPlanner {
    /// Creates a planner with the default base size and baseline memory class.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans the capacity in bytes.
    ///
    /// A positive `explicit` value is passed through unchanged and the reporter
    /// is not consulted. Otherwise the budget is
    /// `base_cache_size * (memory_class / baseline_memory_class)`.
    ///
    /// The division truncates before the multiplication, so a host below the
    /// baseline memory class gets a zero capacity. Such a cache holds nothing.
    ///
    /// # Errors
    /// Returns `CacheError::Configuration` when the reporter has no memory class.
    pub fn plan<R>(&self, explicit: Option<u64>, reporter: &R) -> Result<u64>
    where
        R: MemoryClassReporter + ?Sized,
    {
        if let Some(bytes) = explicit.filter(|&b| b > 0) {
            info!("Using explicit cache capacity of {} bytes", bytes);
            return Ok(bytes);
        }

        let memory_class = reporter.memory_class_mb().ok_or_else(|| {
            CacheError::Configuration("host memory class reporter is unavailable".to_string())
        })?;

        let multiplier = u64::from(memory_class / self.baseline_memory_class);
        let capacity = self.base_cache_size.saturating_mul(multiplier);
        info!(
            "Planned cache capacity of {} bytes from memory class {}MB",
            capacity, memory_class
        );
        Ok(capacity)
    }
}
