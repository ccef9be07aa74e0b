//! A sequence wrapper that trims residency every N accesses.

use std::ops::{Deref, DerefMut};

use framecache_core::config::{DEFAULT_KEEP_RECENT, DEFAULT_OPTIMIZE_EVERY};
use tracing::debug;

use crate::common::Result;
use crate::frame::Frame;
use crate::sequence::FrameSequence;

/// Calls [`FrameSequence::optimize_memory`] after every `optimize_every`
/// successful `get` calls.
///
/// All other sequence operations pass through via `Deref`.
#[derive(Debug)]
pub struct AutoOptimizingSequence {
    inner: FrameSequence,
    optimize_every: usize,
    keep_recent: usize,
    accesses: usize,
}

impl AutoOptimizingSequence {
    pub fn new(inner: FrameSequence) -> Self {
        Self::with_policy(inner, DEFAULT_OPTIMIZE_EVERY, DEFAULT_KEEP_RECENT)
    }

    /// `optimize_every` of zero is treated as one.
    pub fn with_policy(inner: FrameSequence, optimize_every: usize, keep_recent: usize) -> Self {
        Self {
            inner,
            optimize_every: optimize_every.max(1),
            keep_recent,
            accesses: 0,
        }
    }

    pub fn get(&mut self, index: usize) -> Result<Frame> {
        let frame = self.inner.get(index)?;

        self.accesses += 1;
        if self.accesses % self.optimize_every == 0 {
            let released = self.inner.optimize_memory(self.keep_recent);
            debug!(accesses = self.accesses, released, "periodic optimization");
        }
        Ok(frame)
    }

    /// Successful `get` calls so far.
    pub fn accesses(&self) -> usize {
        self.accesses
    }

    pub fn into_inner(self) -> FrameSequence {
        self.inner
    }
}

impl Deref for AutoOptimizingSequence {
    type Target = FrameSequence;

    fn deref(&self) -> &FrameSequence {
        &self.inner
    }
}

impl DerefMut for AutoOptimizingSequence {
    fn deref_mut(&mut self) -> &mut FrameSequence {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ColorFormat, DecodedBuffer, ManagerConfig, SequenceConfig, Shape};
    use crate::frame::{FrameContext, FrameOptions};
    use crate::manager::MemoryManager;
    use crate::source::SourceDescriptor;
    use std::thread;
    use std::time::Duration;

    fn eager_sequence(context: &FrameContext, n: u8) -> FrameSequence {
        let frames = (0..n)
            .map(|i| {
                let pixels =
                    DecodedBuffer::new(vec![i; 3], Shape::new(1, 1, 3), ColorFormat::Rgb).unwrap();
                Frame::with_context(SourceDescriptor::inline(pixels), FrameOptions::new(), context)
            })
            .collect();
        FrameSequence::with_config(
            frames,
            SequenceConfig {
                lazy: false,
                ..SequenceConfig::default()
            },
        )
    }

    #[test]
    fn test_optimizes_every_n_gets() {
        let context = FrameContext::with_manager(MemoryManager::new(ManagerConfig::default()));
        let mut seq = AutoOptimizingSequence::with_policy(eager_sequence(&context, 4), 3, 1);

        seq.get(0).unwrap().materialize().unwrap();
        thread::sleep(Duration::from_millis(2));
        seq.get(1).unwrap().materialize().unwrap();

        // Third access triggers the trim before frame 2 is loaded.
        let third = seq.get(2).unwrap();
        assert_eq!(seq.accesses(), 3);
        assert!(!seq.frames()[0].is_materialized());
        assert!(seq.frames()[1].is_materialized());
        assert!(!third.is_materialized());
    }

    #[test]
    fn test_failed_get_not_counted() {
        let context = FrameContext::with_manager(MemoryManager::new(ManagerConfig::default()));
        let mut seq = AutoOptimizingSequence::new(eager_sequence(&context, 1));

        assert!(seq.get(5).is_err());
        assert_eq!(seq.accesses(), 0);
        assert_eq!(seq.into_inner().len(), 1);
    }
}
