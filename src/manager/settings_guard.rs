//! RAII guard for scoped budget overrides.

use crate::manager::memory_manager::MemoryManager;

/// Restores the manager's budgets when dropped.
///
/// Created by [`MemoryManager::temporary_settings`]. The previous values are
/// captured and the overrides applied under one lock; restoration runs on
/// every exit path, including unwinding.
///
/// Evictions caused by the override are not undone.
///
/// # Example
/// ```
/// use framecache::{ManagerConfig, MemoryManager};
///
/// let manager = MemoryManager::new(ManagerConfig::default());
/// let guard = manager.temporary_settings(None, Some(2));
/// assert_eq!(guard.saved_max_count(), 100);
/// drop(guard);
/// assert_eq!(manager.max_materialized_count(), 100);
/// ```
#[must_use = "budgets are restored as soon as the guard drops"]
pub struct TemporarySettings<'a> {
    manager: &'a MemoryManager,
    saved_threshold: u64,
    saved_max_count: usize,
}

impl<'a> TemporarySettings<'a> {
    pub(crate) fn apply(
        manager: &'a MemoryManager,
        threshold: Option<u64>,
        max_count: Option<usize>,
    ) -> Self {
        let (saved_threshold, saved_max_count) = manager.swap_budgets(threshold, max_count);
        Self {
            manager,
            saved_threshold,
            saved_max_count,
        }
    }

    /// Byte budget in force before the override.
    #[inline]
    pub fn saved_threshold(&self) -> u64 {
        self.saved_threshold
    }

    /// Count budget in force before the override.
    #[inline]
    pub fn saved_max_count(&self) -> usize {
        self.saved_max_count
    }
}

impl Drop for TemporarySettings<'_> {
    fn drop(&mut self) {
        self.manager
            .swap_budgets(Some(self.saved_threshold), Some(self.saved_max_count));
    }
}
