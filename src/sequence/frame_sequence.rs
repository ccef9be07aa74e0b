//! FrameSequence - an ordered list of frames with loading policies.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use framecache_core::config::PLACEHOLDER_SHAPE;

use crate::common::{DecodedBuffer, Error, Metadata, Result, SequenceConfig, Shape};
use crate::frame::{Frame, FrameContext, FrameOptions};
use crate::source::SourceDescriptor;

/// Residency summary of a [`FrameSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequenceMemoryStats {
    pub total_frames: usize,
    pub materialized_count: usize,
    pub total_bytes: u64,
    /// Fraction of frames not resident; 1.0 for an empty sequence.
    pub efficiency: f64,
}

/// An ordered, growable list of [`Frame`] handles.
///
/// Frames are shared, not copied: a slice of a sequence holds the same
/// handles, and materializing a frame through one is visible through the
/// other.
///
/// # Example
/// ```
/// use framecache::{
///     ColorFormat, DecodedBuffer, Frame, FrameContext, FrameOptions, FrameSequence,
///     ManagerConfig, MemoryManager, Shape, SourceDescriptor,
/// };
///
/// let context = FrameContext::with_manager(MemoryManager::new(ManagerConfig::default()));
/// let mut sequence: FrameSequence = (0..5u8)
///     .map(|i| {
///         let pixels = DecodedBuffer::new(vec![i; 3], Shape::new(1, 1, 3), ColorFormat::Rgb).unwrap();
///         Frame::with_context(SourceDescriptor::inline(pixels), FrameOptions::new(), &context)
///     })
///     .collect();
///
/// let frame = sequence.get(2).unwrap();
/// assert!(frame.is_materialized());
/// assert_eq!(sequence.cursor(), Some(2));
/// ```
#[derive(Clone, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    metadata: Metadata,
    config: SequenceConfig,
    cursor: Option<usize>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self::with_config(frames, SequenceConfig::default())
    }

    pub fn with_config(frames: Vec<Frame>, config: SequenceConfig) -> Self {
        Self {
            frames,
            metadata: Metadata::new(),
            config,
            cursor: None,
        }
    }

    /// One lazy frame per image file, in the order given.
    pub fn from_paths<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
        context: &FrameContext,
    ) -> Self {
        paths
            .into_iter()
            .map(|path| {
                Frame::with_context(
                    SourceDescriptor::file(path.as_ref()),
                    FrameOptions::new(),
                    context,
                )
            })
            .collect()
    }

    /// One lazy frame per frame of the video at `path`.
    ///
    /// Only the frame count is read here; pixels are extracted on demand.
    pub fn from_video(path: impl Into<PathBuf>, context: &FrameContext) -> Result<Self> {
        let path = path.into();
        let count = context.backends().video.frame_count(&path)?;
        debug!(path = %path.display(), count, "building sequence from video");

        let frames = (0..count)
            .map(|index| {
                Frame::with_context(
                    SourceDescriptor::video(path.clone(), index),
                    FrameOptions::new().with_metadata("frame_index", index),
                    context,
                )
            })
            .collect();

        let mut sequence = Self::from_frames(frames);
        sequence
            .metadata
            .insert("source".into(), path.display().to_string().into());
        Ok(sequence)
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index of the most recent successful [`FrameSequence::get`].
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Frame at `index`, recording it as the cursor.
    ///
    /// For a lazy sequence the preload window around `index` is loaded first.
    pub fn get(&mut self, index: usize) -> Result<Frame> {
        let frame = self
            .frames
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.frames.len(),
            })?;

        self.cursor = Some(index);
        if self.config.lazy {
            self.preload_around(index);
        }
        Ok(frame)
    }

    /// A new sequence sharing the frames in `range`, clamped to the length.
    pub fn get_slice(&self, range: Range<usize>) -> FrameSequence {
        let end = range.end.min(self.frames.len());
        let start = range.start.min(end);

        Self {
            frames: self.frames[start..end].to_vec(),
            metadata: self.metadata.clone(),
            config: self.config,
            cursor: None,
        }
    }

    // ========================================================================
    // Loading policies
    // ========================================================================

    /// Keep only the window of `preload_window` frames on each side of
    /// `index` resident. Returns how many window frames are resident after.
    ///
    /// Frames outside the window are released before the window is loaded,
    /// so peak residency stays near the window size. Failures are logged and
    /// skipped.
    pub fn preload_around(&self, index: usize) -> usize {
        if index >= self.frames.len() {
            return 0;
        }
        let window = self.config.preload_window;
        let lo = index.saturating_sub(window);
        let hi = index.saturating_add(window).min(self.frames.len() - 1);

        for (i, frame) in self.frames.iter().enumerate() {
            if (i < lo || i > hi) && frame.is_materialized() {
                frame.dematerialize();
            }
        }

        let mut loaded = 0;
        for i in lo..=hi {
            match self.frames[i].materialize() {
                Ok(_) => loaded += 1,
                Err(e) => warn!(index = i, error = %e, "preload skipped frame"),
            }
        }
        loaded
    }

    /// Materialize up to `size` frames starting at `start`.
    ///
    /// A frame that fails is replaced by a zero buffer shaped like the
    /// previous successful buffer in the batch, or by a 480x640 buffer in the
    /// frame's format if none succeeded yet.
    pub fn load_batch(&self, start: usize, size: usize) -> Vec<Arc<DecodedBuffer>> {
        let end = start.saturating_add(size).min(self.frames.len());
        if start >= end {
            return Vec::new();
        }

        let mut batch: Vec<Arc<DecodedBuffer>> = Vec::with_capacity(end - start);
        for i in start..end {
            let frame = &self.frames[i];
            match frame.materialize() {
                Ok(buffer) => batch.push(buffer),
                Err(e) => {
                    warn!(index = i, error = %e, "substituting placeholder in batch");
                    let placeholder = match batch.last() {
                        Some(previous) => DecodedBuffer::zeros(previous.shape(), previous.format()),
                        None => {
                            let (height, width, channels) = PLACEHOLDER_SHAPE;
                            DecodedBuffer::zeros(
                                Shape::new(height, width, channels),
                                frame.format(),
                            )
                        }
                    };
                    batch.push(Arc::new(placeholder));
                }
            }
        }
        batch
    }

    /// Feed consecutive batches to `f` as `(buffers, start_index)`.
    ///
    /// A batch whose callback fails yields `None` and processing continues.
    /// With `unload_after`, lazy frames of each batch are released before
    /// the next batch loads, bounding peak residency to one batch.
    pub fn process_in_batches<R, E, F>(
        &self,
        batch_size: Option<usize>,
        unload_after: bool,
        mut f: F,
    ) -> Vec<Option<R>>
    where
        E: fmt::Display,
        F: FnMut(&[Arc<DecodedBuffer>], usize) -> std::result::Result<R, E>,
    {
        let size = batch_size.unwrap_or(self.config.batch_size).max(1);
        let mut results = Vec::with_capacity(self.frames.len().div_ceil(size));

        let mut start = 0;
        while start < self.frames.len() {
            let batch = self.load_batch(start, size);
            let result = match f(&batch, start) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(start, error = %e, "batch callback failed");
                    None
                }
            };
            results.push(result);
            drop(batch);

            if unload_after {
                let end = (start + size).min(self.frames.len());
                for frame in &self.frames[start..end] {
                    frame.dematerialize();
                }
            }
            start += size;
        }
        results
    }

    /// Release all but the `keep_recent` most recently accessed resident
    /// frames. Returns how many were released.
    ///
    /// Ties in access time keep sequence order. Non-lazy frames are ranked
    /// but never released.
    pub fn optimize_memory(&self, keep_recent: usize) -> usize {
        let mut resident: Vec<(&Frame, _)> = self
            .frames
            .iter()
            .filter_map(|frame| frame.last_access().map(|at| (frame, at)))
            .collect();
        resident.sort_by(|a, b| b.1.cmp(&a.1));

        let released = resident
            .iter()
            .skip(keep_recent)
            .filter(|(frame, _)| frame.dematerialize())
            .count();
        debug!(keep_recent, released, "optimized sequence memory");
        released
    }

    pub fn memory_stats(&self) -> SequenceMemoryStats {
        let total_frames = self.frames.len();
        let (materialized_count, total_bytes) = self
            .frames
            .iter()
            .filter(|frame| frame.is_materialized())
            .fold((0usize, 0u64), |(count, bytes), frame| {
                (count + 1, bytes + frame.resident_bytes() as u64)
            });

        let efficiency = if total_frames == 0 {
            1.0
        } else {
            1.0 - materialized_count as f64 / total_frames as f64
        };

        SequenceMemoryStats {
            total_frames,
            materialized_count,
            total_bytes,
            efficiency,
        }
    }
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::from_frames(iter.into_iter().collect())
    }
}

impl Extend<Frame> for FrameSequence {
    fn extend<I: IntoIterator<Item = Frame>>(&mut self, iter: I) {
        self.frames.extend(iter);
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Debug for FrameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSequence")
            .field("len", &self.frames.len())
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish()
    }
}
