//! Core types and constants for framecache.
//!
//! This crate provides the leaf abstractions used throughout the cache:
//!
//! # Types
//! - [`DecodedBuffer`] - An owned block of pixel data plus its shape
//! - [`Shape`] - Height, width and channel count of a buffer
//! - [`ColorFormat`] - Channel order tag (RGB, BGR, GRAY)
//!
//! # Constants
//! - [`config`] - Default budgets and policy ratios
//!
//! # Error Handling
//! - [`Error`] - Unified error type
//! - [`Result<T>`] - Convenient result alias
//!
//! # Example
//! ```
//! use framecache_core::{ColorFormat, DecodedBuffer, Shape};
//!
//! let buffer = DecodedBuffer::zeros(Shape::new(2, 3, 3), ColorFormat::Rgb);
//! assert_eq!(buffer.size_bytes(), 18);
//! ```

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{DEFAULT_MAX_MATERIALIZED, DEFAULT_MEMORY_THRESHOLD_BYTES};
pub use error::{Error, Result};
pub use types::{ColorFormat, DecodedBuffer, Shape};
