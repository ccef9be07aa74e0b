//! LRU bookkeeping for resident frames.
//!
//! Recency is the reinsertion order of a tick-keyed `BTreeMap`: touching a
//! frame removes its old tick and reinserts it under a fresh one, so the
//! first key is always the least recently used frame. No clock comparisons
//! are needed.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::common::FrameHandle;

/// Size and load time of one resident frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LruEntry {
    pub size_bytes: usize,
    pub load_time: Instant,
    tick: u64,
}

/// Ordered map of resident frames, least recently used first.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Tick -> handle, oldest first.
    order: BTreeMap<u64, FrameHandle>,

    /// Handle -> entry for O(1) lookup and removal.
    entries: HashMap<FrameHandle, LruEntry>,

    next_tick: u64,

    total_bytes: u64,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `handle` to the most-recently-used end, recording `size_bytes`.
    ///
    /// Remove+reinsert: the entry gets a fresh load time and tick.
    pub fn touch(&mut self, handle: FrameHandle, size_bytes: usize) {
        self.remove(handle);

        let tick = self.next_tick;
        self.next_tick += 1;

        self.order.insert(tick, handle);
        self.entries.insert(
            handle,
            LruEntry {
                size_bytes,
                load_time: Instant::now(),
                tick,
            },
        );
        self.total_bytes += size_bytes as u64;
    }

    /// Forget `handle`. Returns its entry if it was tracked.
    pub fn remove(&mut self, handle: FrameHandle) -> Option<LruEntry> {
        let entry = self.entries.remove(&handle)?;
        self.order.remove(&entry.tick);
        self.total_bytes -= entry.size_bytes as u64;
        Some(entry)
    }

    /// Remove and return the least recently used entry other than `except`.
    pub fn pop_oldest_except(
        &mut self,
        except: Option<FrameHandle>,
    ) -> Option<(FrameHandle, LruEntry)> {
        let victim = self
            .order
            .values()
            .copied()
            .find(|&handle| Some(handle) != except)?;
        let entry = self.remove(victim)?;
        Some((victim, entry))
    }

    /// Handles from least to most recently used.
    pub fn handles(&self) -> impl Iterator<Item = FrameHandle> + '_ {
        self.order.values().copied()
    }

    pub fn get(&self, handle: FrameHandle) -> Option<&LruEntry> {
        self.entries.get(&handle)
    }

    #[inline]
    pub fn contains(&self, handle: FrameHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}
