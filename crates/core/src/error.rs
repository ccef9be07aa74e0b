//! Error types for framecache.

use thiserror::Error;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in framecache.
///
/// Only `SourceUnavailable` and `DecodeFailed` escape a materialization.
/// `UnsupportedConversion` is produced by codecs but recovered by the frame,
/// and eviction has no error path at all.
#[derive(Error, Debug)]
pub enum Error {
    /// The frame's origin cannot be reached: missing file, unreachable URL,
    /// bad video index.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source was reached but no backend could decode it.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// The codec cannot convert between the two color formats.
    #[error("unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Writing a buffer out failed.
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// A caller passed an argument the operation cannot honor.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Index past the end of a sequence.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// System memory telemetry could not be sampled.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the source itself is gone, as opposed to
    /// the data being present but undecodable.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Error::SourceUnavailable(_))
    }
}
