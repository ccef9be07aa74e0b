//! Cache statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters tracked by the memory manager.
///
/// All fields are atomic for lock-free updates from frame threads.
///
/// # Memory Ordering
/// `Ordering::Relaxed` throughout: counters are independent and only need
/// atomicity, not cross-counter consistency.
///
/// # Example
/// ```
/// use framecache::CacheCounters;
///
/// let counters = CacheCounters::new();
/// counters.record_hit();
/// assert_eq!(counters.snapshot().cache_hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct CacheCounters {
    /// `materialize` calls answered from a resident buffer.
    pub cache_hits: AtomicU64,

    /// `materialize` calls that had to decode.
    pub cache_misses: AtomicU64,

    /// Frames released by the manager (admission control, pressure
    /// cleanup, explicit eviction).
    pub evictions: AtomicU64,

    /// Bytes released by those evictions.
    pub bytes_evicted: AtomicU64,

    /// Decodes that ended in an error.
    pub decode_failures: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eviction(&self, bytes: usize) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.bytes_evicted.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Non-atomic copy for display and logging.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            bytes_evicted: self.bytes_evicted.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.bytes_evicted.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`CacheCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub bytes_evicted: u64,
    pub decode_failures: u64,
}

impl CounterSnapshot {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}

/// Residency and budgets of a [`crate::MemoryManager`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ManagerStats {
    /// Frames currently in the LRU map.
    pub materialized_count: usize,
    /// Sum of their buffer sizes.
    pub total_bytes: u64,
    pub memory_threshold_bytes: u64,
    pub max_materialized_count: usize,
    /// Live frames in the handle table, resident or not.
    pub registered_frames: usize,
    /// System-wide memory usage, when telemetry is attached and readable.
    pub system_memory_percent: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::new();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
        assert_eq!(counters.hit_rate(), 0.0);
    }

    #[test]
    fn test_counters_hit_rate() {
        let counters = CacheCounters::new();

        for _ in 0..7 {
            counters.record_hit();
        }
        for _ in 0..3 {
            counters.record_miss();
        }

        assert_eq!(counters.hit_rate(), 0.7);
    }

    #[test]
    fn test_counters_eviction_bytes() {
        let counters = CacheCounters::new();
        counters.record_eviction(100);
        counters.record_eviction(28);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.evictions, 2);
        assert_eq!(snapshot.bytes_evicted, 128);
    }

    #[test]
    fn test_counters_reset() {
        let counters = CacheCounters::new();
        counters.record_hit();
        counters.record_decode_failure();

        counters.reset();

        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_snapshot_display() {
        let counters = CacheCounters::new();
        counters.cache_hits.fetch_add(80, Ordering::Relaxed);
        counters.cache_misses.fetch_add(20, Ordering::Relaxed);
        counters.record_eviction(5);

        let display = format!("{}", counters.snapshot());

        assert!(display.contains("hits: 80"));
        assert!(display.contains("misses: 20"));
        assert!(display.contains("80.00%"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = CounterSnapshot {
            cache_hits: 1,
            ..CounterSnapshot::default()
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["cache_hits"], 1);
    }
}
