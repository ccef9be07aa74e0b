//! Frames - lazily materialized images.
//!
//! # Components
//! - [`Frame`] - A shared handle to one logical image
//! - [`FrameOptions`] - Color format, lazy flag and metadata at construction
//! - [`FrameContext`] - The manager and backends a frame reports to
//! - [`Evictable`] - What the manager calls to reclaim memory

mod context;
mod evictable;
#[allow(clippy::module_inception)]
mod frame;

pub use context::FrameContext;
pub use evictable::Evictable;
pub use frame::{Frame, FrameOptions};
