//! Common types and utilities shared across framecache.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Runtime configuration ([`ManagerConfig`], [`SequenceConfig`])
//! - Error types (re-exported from `framecache-core`)
//! - Identifiers ([`FrameHandle`])
//! - Caller metadata ([`Metadata`])

pub mod config;
mod handle;

use std::collections::HashMap;

pub use config::{ManagerConfig, SequenceConfig};
pub use framecache_core::{ColorFormat, DecodedBuffer, Error, Result, Shape};
pub use handle::FrameHandle;

/// Arbitrary caller-supplied key/value annotations on a frame or sequence.
///
/// The `"shape"` key is read by [`crate::Frame::shape`] while a frame is not
/// materialized; it holds `[height, width]` or `[height, width, channels]`.
pub type Metadata = HashMap<String, serde_json::Value>;
