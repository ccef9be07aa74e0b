//! Frame handle type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identifies a frame in the memory manager's tables.
///
/// The manager keys its LRU map and handle table by this integer instead of
/// holding references to frames. Handles are process-unique and never reused.
///
/// # Example
/// ```
/// use framecache::FrameHandle;
///
/// let a = FrameHandle::next();
/// let b = FrameHandle::next();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

impl FrameHandle {
    /// Create a FrameHandle from a raw value.
    #[inline]
    pub fn new(id: u64) -> Self {
        FrameHandle(id)
    }

    /// Allocate a fresh, never-before-issued handle.
    #[inline]
    pub fn next() -> Self {
        FrameHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_handle_new() {
        let handle = FrameHandle::new(10);
        assert_eq!(handle.0, 10);
    }

    #[test]
    fn test_frame_handle_next_is_unique() {
        let handles: Vec<FrameHandle> = (0..100).map(|_| FrameHandle::next()).collect();
        let mut sorted = handles.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), handles.len());
    }

    #[test]
    fn test_frame_handle_display() {
        assert_eq!(format!("{}", FrameHandle::new(42)), "Frame(42)");
    }
}
