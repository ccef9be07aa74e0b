//! Ordered collections of frames with windowed and batched loading.
//!
//! # Components
//! - [`FrameSequence`] - Owns frame handles and drives load/unload policy
//! - [`AutoOptimizingSequence`] - Periodically trims a sequence's residency
//! - [`SequenceMemoryStats`] - Residency summary of one sequence

mod auto_optimize;
mod frame_sequence;

pub use auto_optimize::AutoOptimizingSequence;
pub use frame_sequence::{FrameSequence, SequenceMemoryStats};
