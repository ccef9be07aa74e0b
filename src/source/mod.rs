//! Frame sources and the decode capabilities behind them.
//!
//! A [`SourceDescriptor`] names where a frame's pixels come from. The
//! capability traits turn a descriptor into a [`DecodedBuffer`]:
//! - [`ImageCodec`] - still-image decode/encode, color conversion, resize
//! - [`VideoSource`] - single-frame extraction from a video file
//! - [`NetworkFetch`] - raw bytes from a URL
//!
//! [`Backends`] bundles one implementation of each.

mod codec;
mod fetch;
mod video;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use framecache_core::config::DEFAULT_FETCH_TIMEOUT;

pub use codec::{EncodeFormat, ImageCodec, ImageRsCodec};
pub use fetch::NetworkFetch;
pub use video::{FfmpegVideoSource, VideoSource};

use crate::common::{DecodedBuffer, Error, Result};

/// Immutable description of where a frame's data originates.
///
/// Eviction never touches the descriptor, so a released frame can always be
/// rebuilt from it. `InlineArray` keeps the caller's buffer here, apart from
/// the frame's materialized copy.
#[derive(Clone)]
pub enum SourceDescriptor {
    /// Pixel data supplied directly by the caller.
    InlineArray(Arc<DecodedBuffer>),
    /// An image file on disk.
    FilePath(PathBuf),
    /// An encoded image behind a URL, fetched with a time bound.
    Url { address: String, timeout: Duration },
    /// One frame of a video file.
    VideoPosition { path: PathBuf, frame_index: usize },
}

impl SourceDescriptor {
    pub fn inline(buffer: DecodedBuffer) -> Self {
        SourceDescriptor::InlineArray(Arc::new(buffer))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::FilePath(path.into())
    }

    pub fn url(address: impl Into<String>, timeout: Duration) -> Self {
        SourceDescriptor::Url {
            address: address.into(),
            timeout,
        }
    }

    /// URL source bounded by the default 30 second fetch timeout.
    pub fn remote(address: impl Into<String>) -> Self {
        Self::url(address, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn video(path: impl Into<PathBuf>, frame_index: usize) -> Self {
        SourceDescriptor::VideoPosition {
            path: path.into(),
            frame_index,
        }
    }

    /// Short name of the source kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceDescriptor::InlineArray(_) => "inline",
            SourceDescriptor::FilePath(_) => "file",
            SourceDescriptor::Url { .. } => "url",
            SourceDescriptor::VideoPosition { .. } => "video",
        }
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self, SourceDescriptor::InlineArray(_))
    }

    /// Produce a fresh buffer from this source.
    ///
    /// Blocks on file, process or network I/O.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the file is missing, no fetcher is configured
    ///   for a URL, or the video index is out of range
    /// - `DecodeFailed` if the bytes cannot be decoded
    pub fn decode(&self, backends: &Backends) -> Result<DecodedBuffer> {
        match self {
            SourceDescriptor::InlineArray(buffer) => Ok(DecodedBuffer::clone(buffer)),
            SourceDescriptor::FilePath(path) => {
                ensure_exists(path)?;
                backends.codec.decode(path)
            }
            SourceDescriptor::Url { address, timeout } => {
                let fetch = backends.fetch.as_ref().ok_or_else(|| {
                    Error::SourceUnavailable(format!("no network fetcher configured for {}", address))
                })?;
                let bytes = fetch.get(address, *timeout)?;
                backends.codec.decode_bytes(&bytes)
            }
            SourceDescriptor::VideoPosition { path, frame_index } => {
                ensure_exists(path)?;
                backends.video.extract_frame(path, *frame_index)
            }
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::SourceUnavailable(format!(
            "file not found: {}",
            path.display()
        )))
    }
}

impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::InlineArray(buffer) => {
                f.debug_tuple("InlineArray").field(&buffer.shape()).finish()
            }
            SourceDescriptor::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            SourceDescriptor::Url { address, timeout } => f
                .debug_struct("Url")
                .field("address", address)
                .field("timeout", timeout)
                .finish(),
            SourceDescriptor::VideoPosition { path, frame_index } => f
                .debug_struct("VideoPosition")
                .field("path", path)
                .field("frame_index", frame_index)
                .finish(),
        }
    }
}

/// The decode capabilities a frame materializes through.
#[derive(Clone)]
pub struct Backends {
    pub codec: Arc<dyn ImageCodec>,
    pub video: Arc<dyn VideoSource>,
    /// URL sources fail with `SourceUnavailable` while this is `None`.
    pub fetch: Option<Arc<dyn NetworkFetch>>,
}

impl Backends {
    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_video(mut self, video: Arc<dyn VideoSource>) -> Self {
        self.video = video;
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn NetworkFetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            codec: Arc::new(ImageRsCodec::new()),
            video: Arc::new(FfmpegVideoSource::new()),
            fetch: None,
        }
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("fetch", &self.fetch.is_some())
            .finish_non_exhaustive()
    }
}
