//! framecache - lazily materialized image frames under a shared memory budget.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           framecache                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Sequence Layer (sequence/)                  │   │
//! │  │   FrameSequence: preload window, batches, optimization   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Frame Layer (frame/)                     │   │
//! │  │     Frame = SourceDescriptor + optional DecodedBuffer    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │               ↓ decode                    ↓ note / evict        │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐    │
//! │  │    Sources (source/)     │  │   Manager (manager/)     │    │
//! │  │  image codec, ffmpeg,    │  │  LRU, count/byte budgets │    │
//! │  │  network fetch           │  │  pressure monitor        │    │
//! │  └──────────────────────────┘  └──────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (FrameHandle, Error, config, metadata)
//! - [`source`] - Source descriptors and decode backends
//! - [`frame`] - Lazily materialized frames
//! - [`manager`] - The memory manager and process-wide free functions
//! - [`sequence`] - Ordered frame collections and loading policies
//!
//! # Quick Start
//! ```no_run
//! use framecache::{Frame, FrameOptions, SourceDescriptor};
//!
//! // Nothing is decoded until the pixels are needed.
//! let frame = Frame::new(SourceDescriptor::file("photo.png"), FrameOptions::new());
//! let pixels = frame.materialize().unwrap();
//! println!("{} bytes resident", pixels.size_bytes());
//!
//! // Lazy frames can give their memory back.
//! frame.dematerialize();
//! ```

pub mod common;
pub mod frame;
pub mod manager;
pub mod sequence;
pub mod source;

// Re-export commonly used items at crate root for convenience
pub use common::{
    ColorFormat, DecodedBuffer, Error, FrameHandle, ManagerConfig, Metadata, Result,
    SequenceConfig, Shape,
};

pub use frame::{Evictable, Frame, FrameContext, FrameOptions};
pub use manager::{
    force_cleanup, global_manager, memory_stats, set_max_materialized, set_memory_threshold,
    shutdown, with_temporary_settings, CacheCounters, CounterSnapshot, ManagerStats,
    MemoryManager, SysinfoTelemetry, SystemTelemetry, TemporarySettings,
};
pub use sequence::{AutoOptimizingSequence, FrameSequence, SequenceMemoryStats};
pub use source::{
    Backends, EncodeFormat, FfmpegVideoSource, ImageCodec, ImageRsCodec, NetworkFetch,
    SourceDescriptor, VideoSource,
};
