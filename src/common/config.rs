//! Runtime configuration for the memory manager and frame sequences.
//!
//! Defaults come from [`framecache_core::config`]. The process-wide manager
//! reads overrides from the environment through [`ManagerConfig::from_env`]:
//!
//! | Variable | Field |
//! |---|---|
//! | `FRAMECACHE_MEMORY_THRESHOLD` | `memory_threshold_bytes` |
//! | `FRAMECACHE_MAX_MATERIALIZED` | `max_materialized_count` |
//! | `FRAMECACHE_MONITOR_INTERVAL_SECS` | `monitor_interval_secs` (0 disables) |
//! | `FRAMECACHE_PRESSURE_PERCENT` | `pressure_trigger_percent` |

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use framecache_core::config::{
    CLEANUP_TARGET_RATIO, DEFAULT_BATCH_SIZE, DEFAULT_MAX_MATERIALIZED,
    DEFAULT_MEMORY_THRESHOLD_BYTES, DEFAULT_MONITOR_INTERVAL, DEFAULT_PRELOAD_WINDOW,
    PRESSURE_TRIGGER_PERCENT,
};
use framecache_core::{Error, Result};

/// Budgets and policy knobs for a [`crate::MemoryManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Byte budget for resident frames.
    pub memory_threshold_bytes: u64,
    /// Maximum number of resident frames.
    pub max_materialized_count: usize,
    /// Fraction of the byte budget a size-bounded cleanup shrinks to.
    pub cleanup_ratio: f64,
    /// System memory usage (percent) that triggers a background cleanup.
    pub pressure_trigger_percent: f32,
    /// Background monitor period in seconds; 0 disables the monitor.
    pub monitor_interval_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            memory_threshold_bytes: DEFAULT_MEMORY_THRESHOLD_BYTES,
            max_materialized_count: DEFAULT_MAX_MATERIALIZED,
            cleanup_ratio: CLEANUP_TARGET_RATIO,
            pressure_trigger_percent: PRESSURE_TRIGGER_PERCENT,
            monitor_interval_secs: DEFAULT_MONITOR_INTERVAL.as_secs(),
        }
    }
}

impl ManagerConfig {
    /// Defaults overridden by any `FRAMECACHE_*` variables that are set.
    ///
    /// # Errors
    /// `InvalidArgument` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "FRAMECACHE_MEMORY_THRESHOLD")? {
            config.memory_threshold_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, "FRAMECACHE_MAX_MATERIALIZED")? {
            config.max_materialized_count = v;
        }
        if let Some(v) = parse_var(&lookup, "FRAMECACHE_MONITOR_INTERVAL_SECS")? {
            config.monitor_interval_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "FRAMECACHE_PRESSURE_PERCENT")? {
            config.pressure_trigger_percent = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject ratios and percentages outside their meaningful range.
    pub fn validate(&self) -> Result<()> {
        if !(self.cleanup_ratio > 0.0 && self.cleanup_ratio <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "cleanup_ratio must be in (0, 1], got {}",
                self.cleanup_ratio
            )));
        }
        if !(0.0..=100.0).contains(&self.pressure_trigger_percent) {
            return Err(Error::InvalidArgument(format!(
                "pressure_trigger_percent must be in [0, 100], got {}",
                self.pressure_trigger_percent
            )));
        }
        Ok(())
    }

    /// Monitor period, or `None` when the monitor is disabled.
    pub fn monitor_interval(&self) -> Option<Duration> {
        match self.monitor_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidArgument(format!("{}={:?}: {}", key, raw, e))),
    }
}

/// Loading policy for a [`crate::FrameSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Frames per batch when no explicit size is given.
    pub batch_size: usize,
    /// Frames kept resident on each side of the cursor.
    pub preload_window: usize,
    /// Whether `get` drives windowed preloading.
    pub lazy: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            preload_window: DEFAULT_PRELOAD_WINDOW,
            lazy: true,
        }
    }
}
