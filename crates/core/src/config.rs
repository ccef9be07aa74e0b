//! Default budgets and policy constants.

use std::time::Duration;

/// Default byte budget for resident frames (1 GiB).
pub const DEFAULT_MEMORY_THRESHOLD_BYTES: u64 = 1024 * 1024 * 1024;

/// Default maximum number of resident frames.
pub const DEFAULT_MAX_MATERIALIZED: usize = 100;

/// Fraction of the byte budget that a size-bounded cleanup shrinks to.
pub const CLEANUP_TARGET_RATIO: f64 = 0.8;

/// System memory usage (percent) above which the monitor forces a cleanup.
pub const PRESSURE_TRIGGER_PERCENT: f32 = 85.0;

/// Default period of the background memory monitor.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of frames per batch in a sequence.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default number of frames kept resident on each side of the cursor.
pub const DEFAULT_PRELOAD_WINDOW: usize = 3;

/// Default number of `get` calls between automatic optimizations.
pub const DEFAULT_OPTIMIZE_EVERY: usize = 50;

/// Default number of frames an automatic optimization keeps resident.
pub const DEFAULT_KEEP_RECENT: usize = 20;

/// Default network timeout for URL-sourced frames.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Shape of the zero-filled placeholder used in a batch before any
/// frame in that batch decoded successfully: (height, width, channels).
pub const PLACEHOLDER_SHAPE: (u32, u32, u8) = (480, 640, 3);

/// Computes the byte target a size-bounded cleanup aims for.
#[inline]
pub fn cleanup_target(threshold_bytes: u64, ratio: f64) -> u64 {
    (threshold_bytes as f64 * ratio) as u64
}
