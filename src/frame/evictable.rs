//! The capability the memory manager evicts through.

use crate::common::FrameHandle;

/// Something whose resident memory the manager may reclaim at any time.
///
/// The manager's handle table stores `Weak<dyn Evictable>` so it can release
/// victims without owning them.
pub trait Evictable: Send + Sync {
    fn handle(&self) -> FrameHandle;

    /// Whether a buffer is currently held.
    fn is_resident(&self) -> bool;

    /// Drop the resident buffer unconditionally and return the bytes
    /// released (0 if nothing was held).
    ///
    /// Called with the manager's lock held: must only release memory, never
    /// perform I/O or call back into the manager.
    fn force_evict(&self) -> usize;
}
