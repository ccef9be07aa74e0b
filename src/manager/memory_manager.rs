//! Memory Manager - the cache coordinator for resident frames.
//!
//! The [`MemoryManager`] provides:
//! - LRU ordering of materialized frames
//! - Admission control against a count budget and a byte budget
//! - A handle table for administrative eviction
//! - An optional background check against system memory pressure

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use framecache_core::config::cleanup_target;

use crate::common::{FrameHandle, ManagerConfig, Result};
use crate::frame::Evictable;
use crate::manager::lru::LruTracker;
use crate::manager::monitor::MonitorHandle;
use crate::manager::settings_guard::TemporarySettings;
use crate::manager::stats::{CacheCounters, ManagerStats};
use crate::manager::telemetry::SystemTelemetry;

/// Coordinates which frames stay resident.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                       MemoryManager                         │
/// │  ┌──────────────────────── Mutex ──────────────────────┐    │
/// │  │  lru: LruTracker        registry: Handle → Weak     │    │
/// │  │  (oldest ... newest)    (every live frame)          │    │
/// │  │  memory_threshold_bytes   max_materialized_count    │    │
/// │  └─────────────────────────────────────────────────────┘    │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
/// │  │   counters   │  │  telemetry   │  │   monitor    │       │
/// │  │   (atomic)   │  │   RwLock     │  │   thread     │       │
/// │  └──────────────┘  └──────────────┘  └──────────────┘       │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// One mutex guards the LRU map, handle table and budgets. Decoding never
/// happens under it; eviction under it only calls
/// [`Evictable::force_evict`], which releases memory and returns.
///
/// Strong references obtained by upgrading the handle table are dropped
/// only after the mutex is released, because dropping the last handle to a
/// frame re-enters [`MemoryManager::unregister`].
///
/// # Usage
/// ```
/// use framecache::{ManagerConfig, MemoryManager};
///
/// let manager = MemoryManager::new(ManagerConfig {
///     max_materialized_count: 8,
///     ..ManagerConfig::default()
/// });
/// assert_eq!(manager.stats().max_materialized_count, 8);
/// ```
pub struct MemoryManager {
    state: Mutex<ManagerState>,

    counters: CacheCounters,

    /// Fraction of the byte budget a size-bounded cleanup shrinks to.
    cleanup_ratio: f64,

    /// System memory percentage that triggers a pressure cleanup.
    pressure_trigger_percent: f32,

    telemetry: RwLock<Option<Arc<dyn SystemTelemetry>>>,

    monitor: Mutex<Option<MonitorHandle>>,
}

struct ManagerState {
    lru: LruTracker,
    registry: HashMap<FrameHandle, Weak<dyn Evictable>>,
    memory_threshold_bytes: u64,
    max_materialized_count: usize,
}

/// Strong references collected under the lock, released after it.
type Keepalive = Vec<Arc<dyn Evictable>>;

impl MemoryManager {
    /// Create a manager. The background monitor is not started; see
    /// [`MemoryManager::start_monitor`].
    pub fn new(config: ManagerConfig) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ManagerState {
                lru: LruTracker::new(),
                registry: HashMap::new(),
                memory_threshold_bytes: config.memory_threshold_bytes,
                max_materialized_count: config.max_materialized_count,
            }),
            counters: CacheCounters::new(),
            cleanup_ratio: config.cleanup_ratio,
            pressure_trigger_percent: config.pressure_trigger_percent,
            telemetry: RwLock::new(None),
            monitor: Mutex::new(None),
        })
    }

    // ========================================================================
    // Handle table
    // ========================================================================

    /// Add a live frame to the handle table.
    pub fn register(&self, handle: FrameHandle, frame: Weak<dyn Evictable>) {
        self.state.lock().registry.insert(handle, frame);
    }

    /// Remove a frame from the handle table and the LRU map.
    ///
    /// Frames call this from their teardown.
    pub fn unregister(&self, handle: FrameHandle) {
        let mut state = self.state.lock();
        state.registry.remove(&handle);
        state.lru.remove(handle);
    }

    // ========================================================================
    // Residency bookkeeping
    // ========================================================================

    /// Record that `handle` is resident with `size_bytes`, then run admission
    /// control. Returns the number of other frames evicted.
    ///
    /// The entry moves to the most-recently-used end. While the count budget
    /// is exceeded the oldest other frame is evicted; if the byte budget is
    /// exceeded, oldest other frames are evicted until the total is at or
    /// below `cleanup_ratio` of it.
    ///
    /// A handle that is unknown or no longer resident (evicted between its
    /// decode and this call) is ignored.
    pub fn note_materialized(&self, handle: FrameHandle, size_bytes: usize) -> usize {
        let mut keepalive = Keepalive::new();
        let mut state = self.state.lock();

        let Some(frame) = state.registry.get(&handle).and_then(Weak::upgrade) else {
            return 0;
        };
        let resident = frame.is_resident();
        keepalive.push(frame);
        if !resident {
            drop(state);
            return 0;
        }

        state.lru.touch(handle, size_bytes);
        let evicted = self.admit(&mut state, Some(handle), &mut keepalive);

        drop(state);
        drop(keepalive);
        evicted
    }

    /// Forget `handle`'s residency. Returns whether it was tracked.
    pub fn note_dematerialized(&self, handle: FrameHandle) -> bool {
        self.state.lock().lru.remove(handle).is_some()
    }

    /// Evict one frame regardless of its lazy flag.
    ///
    /// Returns `true` if a buffer was released.
    pub fn evict(&self, handle: FrameHandle) -> bool {
        let mut keepalive = Keepalive::new();
        let mut state = self.state.lock();

        state.lru.remove(handle);
        let released = self.release(&state, handle, &mut keepalive);

        drop(state);
        drop(keepalive);
        released.is_some()
    }

    /// Evict every resident frame. Returns the number evicted.
    pub fn force_cleanup(&self) -> usize {
        let evicted = self.shrink(|_| 0);
        info!(evicted, "forced cleanup");
        evicted
    }

    /// Evict least recently used frames until resident bytes are at or below
    /// `target_bytes`. Returns the number evicted.
    pub fn cleanup_to(&self, target_bytes: u64) -> usize {
        self.shrink(|_| target_bytes)
    }

    /// Apply both budgets now instead of at the next materialization.
    pub fn enforce_budgets(&self) -> usize {
        let mut keepalive = Keepalive::new();
        let mut state = self.state.lock();
        let evicted = self.admit(&mut state, None, &mut keepalive);
        drop(state);
        drop(keepalive);
        evicted
    }

    /// Sample `telemetry` once and, if system memory usage exceeds the
    /// pressure trigger, shrink to `cleanup_ratio` of the byte budget.
    ///
    /// This is the body of the background monitor.
    pub fn relieve_pressure(&self, telemetry: &dyn SystemTelemetry) -> Result<usize> {
        let percent = telemetry.used_memory_percent()?;
        if percent <= self.pressure_trigger_percent {
            return Ok(0);
        }

        let ratio = self.cleanup_ratio;
        let evicted = self.shrink(|state| cleanup_target(state.memory_threshold_bytes, ratio));
        info!(percent, evicted, "system memory pressure cleanup");
        Ok(evicted)
    }

    fn shrink(&self, target: impl FnOnce(&ManagerState) -> u64) -> usize {
        let mut keepalive = Keepalive::new();
        let mut state = self.state.lock();
        let target = target(&state);
        let evicted = self.shrink_locked(&mut state, target, None, &mut keepalive);
        drop(state);
        drop(keepalive);
        evicted
    }

    /// Admission control: count budget first, then byte budget.
    fn admit(
        &self,
        state: &mut ManagerState,
        protect: Option<FrameHandle>,
        keepalive: &mut Keepalive,
    ) -> usize {
        let mut evicted = 0;

        while state.lru.len() > state.max_materialized_count {
            let Some((victim, _)) = state.lru.pop_oldest_except(protect) else {
                break;
            };
            self.release(state, victim, keepalive);
            evicted += 1;
        }

        if state.lru.total_bytes() > state.memory_threshold_bytes {
            let target = cleanup_target(state.memory_threshold_bytes, self.cleanup_ratio);
            evicted += self.shrink_locked(state, target, protect, keepalive);
        }

        if evicted > 0 {
            debug!(
                evicted,
                resident = state.lru.len(),
                bytes = state.lru.total_bytes(),
                "admission control"
            );
        }
        evicted
    }

    fn shrink_locked(
        &self,
        state: &mut ManagerState,
        target_bytes: u64,
        protect: Option<FrameHandle>,
        keepalive: &mut Keepalive,
    ) -> usize {
        let mut evicted = 0;
        while state.lru.total_bytes() > target_bytes {
            let Some((victim, _)) = state.lru.pop_oldest_except(protect) else {
                break;
            };
            self.release(state, victim, keepalive);
            evicted += 1;
        }
        evicted
    }

    /// Force-evict `handle` through the handle table. The caller has already
    /// removed it from the LRU map.
    fn release(
        &self,
        state: &ManagerState,
        handle: FrameHandle,
        keepalive: &mut Keepalive,
    ) -> Option<usize> {
        let frame = state.registry.get(&handle).and_then(Weak::upgrade)?;
        let was_resident = frame.is_resident();
        let bytes = frame.force_evict();
        keepalive.push(frame);

        if !was_resident {
            return None;
        }
        self.counters.record_eviction(bytes);
        debug!(frame = %handle, bytes, "evicted");
        Some(bytes)
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    /// Set the byte budget. Takes effect at the next admission check.
    pub fn set_threshold(&self, bytes: u64) {
        self.state.lock().memory_threshold_bytes = bytes;
    }

    /// Set the count budget. Takes effect at the next admission check.
    pub fn set_max_count(&self, count: usize) {
        self.state.lock().max_materialized_count = count;
    }

    pub fn memory_threshold(&self) -> u64 {
        self.state.lock().memory_threshold_bytes
    }

    pub fn max_materialized_count(&self) -> usize {
        self.state.lock().max_materialized_count
    }

    /// Apply overrides and return the values they replaced, atomically.
    pub(crate) fn swap_budgets(
        &self,
        threshold: Option<u64>,
        max_count: Option<usize>,
    ) -> (u64, usize) {
        let mut state = self.state.lock();
        let saved = (state.memory_threshold_bytes, state.max_materialized_count);
        if let Some(bytes) = threshold {
            state.memory_threshold_bytes = bytes;
        }
        if let Some(count) = max_count {
            state.max_materialized_count = count;
        }
        saved
    }

    /// Override budgets until the returned guard drops.
    ///
    /// # Example
    /// ```
    /// use framecache::{ManagerConfig, MemoryManager};
    ///
    /// let manager = MemoryManager::new(ManagerConfig::default());
    /// {
    ///     let _guard = manager.temporary_settings(Some(1024), Some(4));
    ///     assert_eq!(manager.max_materialized_count(), 4);
    /// }
    /// assert_eq!(manager.max_materialized_count(), 100);
    /// ```
    pub fn temporary_settings(
        &self,
        threshold: Option<u64>,
        max_count: Option<usize>,
    ) -> TemporarySettings<'_> {
        TemporarySettings::apply(self, threshold, max_count)
    }

    /// Run `f` with overridden budgets, restoring the previous values on
    /// every exit path, including `Err` returns and panics.
    pub fn with_temporary_settings<R>(
        &self,
        threshold: Option<u64>,
        max_count: Option<usize>,
        f: impl FnOnce() -> R,
    ) -> R {
        let _guard = self.temporary_settings(threshold, max_count);
        f()
    }

    // ========================================================================
    // Stats and info
    // ========================================================================

    pub fn stats(&self) -> ManagerStats {
        let telemetry = self.telemetry.read().clone();
        let system_memory_percent = telemetry.and_then(|t| t.used_memory_percent().ok());

        let state = self.state.lock();
        ManagerStats {
            materialized_count: state.lru.len(),
            total_bytes: state.lru.total_bytes(),
            memory_threshold_bytes: state.memory_threshold_bytes,
            max_materialized_count: state.max_materialized_count,
            registered_frames: state.registry.len(),
            system_memory_percent,
        }
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Number of frames in the LRU map.
    pub fn resident_count(&self) -> usize {
        self.state.lock().lru.len()
    }

    pub fn resident_bytes(&self) -> u64 {
        self.state.lock().lru.total_bytes()
    }

    /// Whether `handle` is in the LRU map.
    pub fn is_resident(&self, handle: FrameHandle) -> bool {
        self.state.lock().lru.contains(handle)
    }

    /// Number of live frames in the handle table.
    pub fn registered_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// Handles from least to most recently used.
    pub fn lru_order(&self) -> Vec<FrameHandle> {
        self.state.lock().lru.handles().collect()
    }

    // ========================================================================
    // Background monitor
    // ========================================================================

    /// Attach telemetry used by [`MemoryManager::stats`].
    pub fn set_telemetry(&self, telemetry: Option<Arc<dyn SystemTelemetry>>) {
        *self.telemetry.write() = telemetry;
    }

    /// Start the periodic pressure check on a dedicated thread, replacing
    /// any monitor already running.
    ///
    /// The thread holds only a weak reference to the manager and is stopped
    /// and joined when the manager drops or [`MemoryManager::stop_monitor`]
    /// is called.
    pub fn start_monitor(
        self: &Arc<Self>,
        telemetry: Arc<dyn SystemTelemetry>,
        interval: Duration,
    ) -> Result<()> {
        self.set_telemetry(Some(Arc::clone(&telemetry)));
        let handle = MonitorHandle::spawn(Arc::downgrade(self), telemetry, interval)?;
        let previous = self.monitor.lock().replace(handle);
        drop(previous);
        Ok(())
    }

    /// Stop the background monitor. Returns whether one was running.
    pub fn stop_monitor(&self) -> bool {
        let handle = self.monitor.lock().take();
        match handle {
            Some(mut handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.lock().is_some()
    }
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryManager")
            .field("resident", &state.lru.len())
            .field("total_bytes", &state.lru.total_bytes())
            .field("memory_threshold_bytes", &state.memory_threshold_bytes)
            .field("max_materialized_count", &state.max_materialized_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stand-in frame that holds `size` bytes until evicted.
    struct FakeFrame {
        handle: FrameHandle,
        resident: AtomicUsize,
    }

    impl FakeFrame {
        fn new(size: usize) -> Arc<Self> {
            Arc::new(Self {
                handle: FrameHandle::next(),
                resident: AtomicUsize::new(size),
            })
        }
    }

    impl Evictable for FakeFrame {
        fn handle(&self) -> FrameHandle {
            self.handle
        }

        fn is_resident(&self) -> bool {
            self.resident.load(Ordering::SeqCst) > 0
        }

        fn force_evict(&self) -> usize {
            self.resident.swap(0, Ordering::SeqCst)
        }
    }

    struct FixedTelemetry(Option<f32>);

    impl SystemTelemetry for FixedTelemetry {
        fn used_memory_percent(&self) -> Result<f32> {
            self.0.ok_or_else(|| Error::Telemetry("unavailable".into()))
        }
    }

    fn manager(threshold: u64, max_count: usize) -> Arc<MemoryManager> {
        MemoryManager::new(ManagerConfig {
            memory_threshold_bytes: threshold,
            max_materialized_count: max_count,
            ..ManagerConfig::default()
        })
    }

    fn add(manager: &MemoryManager, size: usize) -> Arc<FakeFrame> {
        let frame = FakeFrame::new(size);
        let weak: Weak<dyn Evictable> = Arc::downgrade(&frame) as Weak<dyn Evictable>;
        manager.register(frame.handle, weak);
        manager.note_materialized(frame.handle, size);
        frame
    }

    #[test]
    fn test_count_budget_evicts_oldest() {
        let manager = manager(u64::MAX, 3);
        let frames: Vec<_> = (0..5).map(|_| add(&manager, 10)).collect();

        assert_eq!(manager.resident_count(), 3);
        assert!(!frames[0].is_resident());
        assert!(!frames[1].is_resident());
        assert!(frames[2].is_resident());
        assert!(frames[4].is_resident());
        assert_eq!(manager.counters().snapshot().evictions, 2);
    }

    #[test]
    fn test_touch_protects_from_eviction() {
        let manager = manager(u64::MAX, 2);
        let a = add(&manager, 1);
        let b = add(&manager, 1);

        // Re-noting `a` makes `b` the oldest.
        manager.note_materialized(a.handle, 1);
        let _c = add(&manager, 1);

        assert!(a.is_resident());
        assert!(!b.is_resident());
    }

    #[test]
    fn test_byte_budget_shrinks_to_ratio() {
        let manager = manager(1000, 100);
        let frames: Vec<_> = (0..4).map(|_| add(&manager, 300)).collect();

        // 1200 > 1000, so evict until <= 800: drops the oldest two.
        assert_eq!(manager.resident_bytes(), 600);
        assert!(!frames[0].is_resident());
        assert!(!frames[1].is_resident());
        assert!(frames[3].is_resident());
    }

    #[test]
    fn test_newly_noted_frame_is_never_its_own_victim() {
        let manager = manager(100, 100);
        let big = add(&manager, 500);

        assert!(big.is_resident());
        assert_eq!(manager.resident_count(), 1);
    }

    #[test]
    fn test_note_ignores_non_resident() {
        let manager = manager(u64::MAX, 10);
        let frame = add(&manager, 10);
        frame.force_evict();

        manager.note_dematerialized(frame.handle);
        manager.note_materialized(frame.handle, 10);

        assert_eq!(manager.resident_count(), 0);
    }

    #[test]
    fn test_note_dematerialized_unknown_is_noop() {
        let manager = manager(u64::MAX, 10);
        assert!(!manager.note_dematerialized(FrameHandle::new(u64::MAX)));
    }

    #[test]
    fn test_evict_already_released_is_noop() {
        let manager = manager(u64::MAX, 10);
        let frame = add(&manager, 10);

        assert!(manager.evict(frame.handle));
        assert!(!manager.evict(frame.handle));
        assert_eq!(manager.counters().snapshot().evictions, 1);
    }

    #[test]
    fn test_force_cleanup() {
        let manager = manager(u64::MAX, 10);
        let frames: Vec<_> = (0..4).map(|_| add(&manager, 10)).collect();

        assert_eq!(manager.force_cleanup(), 4);
        assert_eq!(manager.resident_count(), 0);
        assert!(frames.iter().all(|f| !f.is_resident()));
        assert_eq!(manager.registered_count(), 4);
    }

    #[test]
    fn test_dropped_frame_is_skipped() {
        let manager = manager(u64::MAX, 10);
        let frame = add(&manager, 10);
        drop(frame);

        // The LRU entry remains until unregister; eviction finds nothing.
        assert!(!manager.evict(FrameHandle::new(0)));
        assert_eq!(manager.force_cleanup(), 1);
        assert_eq!(manager.counters().snapshot().evictions, 0);
    }

    #[test]
    fn test_lowered_budget_applies_on_enforce() {
        let manager = manager(u64::MAX, 10);
        let _frames: Vec<_> = (0..6).map(|_| add(&manager, 10)).collect();

        manager.set_max_count(2);
        assert_eq!(manager.resident_count(), 6);

        assert_eq!(manager.enforce_budgets(), 4);
        assert_eq!(manager.resident_count(), 2);
    }

    #[test]
    fn test_relieve_pressure() {
        let manager = manager(1000, 100);
        let _frames: Vec<_> = (0..3).map(|_| add(&manager, 300)).collect();
        assert_eq!(manager.resident_bytes(), 900);

        assert_eq!(manager.relieve_pressure(&FixedTelemetry(Some(50.0))).unwrap(), 0);
        assert_eq!(manager.resident_bytes(), 900);

        assert_eq!(manager.relieve_pressure(&FixedTelemetry(Some(90.0))).unwrap(), 1);
        assert_eq!(manager.resident_bytes(), 600);

        assert!(manager.relieve_pressure(&FixedTelemetry(None)).is_err());
    }

    #[test]
    fn test_stats() {
        let manager = manager(4096, 7);
        manager.set_telemetry(Some(Arc::new(FixedTelemetry(Some(42.0)))));
        let _a = add(&manager, 100);
        let _b = add(&manager, 28);

        let stats = manager.stats();
        assert_eq!(stats.materialized_count, 2);
        assert_eq!(stats.total_bytes, 128);
        assert_eq!(stats.memory_threshold_bytes, 4096);
        assert_eq!(stats.max_materialized_count, 7);
        assert_eq!(stats.registered_frames, 2);
        assert_eq!(stats.system_memory_percent, Some(42.0));
    }

    #[test]
    fn test_lru_order() {
        let manager = manager(u64::MAX, 10);
        let a = add(&manager, 1);
        let b = add(&manager, 1);
        manager.note_materialized(a.handle, 1);

        assert_eq!(manager.lru_order(), vec![b.handle, a.handle]);
    }

    #[test]
    fn test_monitor_start_stop() {
        let manager = manager(u64::MAX, 10);
        manager
            .start_monitor(Arc::new(FixedTelemetry(Some(10.0))), Duration::from_millis(5))
            .unwrap();
        assert!(manager.is_monitoring());

        std::thread::sleep(Duration::from_millis(20));

        assert!(manager.stop_monitor());
        assert!(!manager.is_monitoring());
        assert!(!manager.stop_monitor());
    }

    #[test]
    fn test_monitor_cleans_under_pressure() {
        let manager = manager(1000, 100);
        let frames: Vec<_> = (0..3).map(|_| add(&manager, 300)).collect();

        manager
            .start_monitor(Arc::new(FixedTelemetry(Some(99.0))), Duration::from_millis(5))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while manager.resident_bytes() > 800 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        manager.stop_monitor();

        assert!(manager.resident_bytes() <= 800);
        assert!(!frames[0].is_resident());
    }

    #[test]
    fn test_drop_stops_monitor() {
        let manager = manager(u64::MAX, 10);
        manager
            .start_monitor(Arc::new(FixedTelemetry(None)), Duration::from_millis(5))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        drop(manager);
    }
}
