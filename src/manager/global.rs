//! The process-wide memory manager and free functions over it.
//!
//! The manager is created on first use from [`ManagerConfig::from_env`]. If
//! a monitor interval is configured, the background pressure check starts
//! with [`SysinfoTelemetry`].

use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::common::ManagerConfig;
use crate::manager::memory_manager::MemoryManager;
use crate::manager::stats::ManagerStats;
use crate::manager::telemetry::SysinfoTelemetry;

static GLOBAL_MANAGER: OnceLock<Arc<MemoryManager>> = OnceLock::new();

/// The shared manager used by frames built without an explicit context.
pub fn global_manager() -> Arc<MemoryManager> {
    GLOBAL_MANAGER.get_or_init(init_global).clone()
}

fn init_global() -> Arc<MemoryManager> {
    let config = ManagerConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring invalid FRAMECACHE_* settings");
        ManagerConfig::default()
    });
    let interval = config.monitor_interval();
    let manager = MemoryManager::new(config);

    if let Some(interval) = interval {
        if let Err(e) = manager.start_monitor(Arc::new(SysinfoTelemetry::new()), interval) {
            warn!(error = %e, "memory monitor not started");
        }
    }
    info!(?manager, "global memory manager initialized");
    manager
}

pub fn memory_stats() -> ManagerStats {
    global_manager().stats()
}

pub fn set_memory_threshold(bytes: u64) {
    global_manager().set_threshold(bytes);
}

pub fn set_max_materialized(count: usize) {
    global_manager().set_max_count(count);
}

/// Evict every resident frame in the shared manager.
pub fn force_cleanup() -> usize {
    global_manager().force_cleanup()
}

/// Run `f` with the shared manager's budgets overridden.
pub fn with_temporary_settings<R>(
    threshold: Option<u64>,
    max_count: Option<usize>,
    f: impl FnOnce() -> R,
) -> R {
    global_manager().with_temporary_settings(threshold, max_count, f)
}

/// Stop the shared manager's background monitor, if it was ever started.
///
/// Statics are never dropped, so long-running hosts that want a clean exit
/// call this before returning from `main`.
pub fn shutdown() {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.stop_monitor();
    }
}
