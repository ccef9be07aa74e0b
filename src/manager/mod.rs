//! Memory management for resident frames.
//!
//! This module provides:
//! - [`MemoryManager`] - LRU admission control over count and byte budgets
//! - [`TemporarySettings`] - RAII guard for scoped budget overrides
//! - [`CacheCounters`] - Hit, miss and eviction counters
//! - [`SystemTelemetry`] - Source of system memory usage for the monitor
//! - Free functions over the process-wide manager

mod global;
mod lru;
mod memory_manager;
mod monitor;
mod settings_guard;
mod stats;
mod telemetry;

pub use global::{
    force_cleanup, global_manager, memory_stats, set_max_materialized, set_memory_threshold,
    shutdown, with_temporary_settings,
};
pub use lru::{LruEntry, LruTracker};
pub use memory_manager::MemoryManager;
pub use settings_guard::TemporarySettings;
pub use stats::{CacheCounters, CounterSnapshot, ManagerStats};
pub use telemetry::{SysinfoTelemetry, SystemTelemetry};
