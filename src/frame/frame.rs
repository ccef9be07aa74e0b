//! Frame - one logical image that may or may not be resident.
//!
//! A [`Frame`] pairs an immutable [`SourceDescriptor`] with an optional
//! decoded buffer:
//! - `materialize` decodes on a miss and reports the new resident bytes
//! - `dematerialize` releases the buffer, but only for lazy frames
//! - the memory manager can release any frame through [`Evictable`]

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, warn};

use crate::common::{ColorFormat, DecodedBuffer, FrameHandle, Metadata, Result, Shape};
use crate::frame::{Evictable, FrameContext};
use crate::source::{EncodeFormat, SourceDescriptor};

/// Construction-time settings for a [`Frame`].
#[derive(Debug, Clone)]
pub struct FrameOptions {
    /// Channel order the frame's buffer is converted to after decoding.
    pub format: ColorFormat,
    /// Whether `dematerialize` is allowed to release the buffer.
    pub lazy: bool,
    /// Caller annotations carried by the frame. A `"shape"` entry of
    /// `[height, width]` or `[height, width, channels]` lets
    /// [`Frame::shape`] answer without decoding.
    pub metadata: Metadata,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            format: ColorFormat::Rgb,
            lazy: true,
            metadata: Metadata::new(),
        }
    }
}

impl FrameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: ColorFormat) -> Self {
        self.format = format;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A shared handle to one logical image.
///
/// Cloning a `Frame` clones the handle, not the pixels: all clones see the
/// same materialization state. When the last handle drops, the frame is
/// removed from its manager's tables.
///
/// # Thread Safety
/// - `state`: `RwLock` around the resident buffer and its bookkeeping
/// - `load_lock`: `Mutex` serializing materialize/dematerialize on this
///   frame, so concurrent callers decode at most once
/// - `access_count`: `AtomicU64`
///
/// Lock order is `load_lock` -> manager mutex -> `state`. The manager only
/// ever takes `state` (through [`Evictable`]), never `load_lock`.
///
/// # Example
/// ```
/// use framecache::{ColorFormat, DecodedBuffer, Frame, FrameOptions, Shape, SourceDescriptor};
///
/// let pixels = DecodedBuffer::zeros(Shape::new(2, 2, 3), ColorFormat::Rgb);
/// let frame = Frame::new(SourceDescriptor::inline(pixels), FrameOptions::new());
/// assert!(!frame.is_materialized());
///
/// let buffer = frame.materialize().unwrap();
/// assert_eq!(buffer.size_bytes(), 12);
/// assert_eq!(frame.resident_bytes(), 12);
/// ```
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

struct FrameInner {
    handle: FrameHandle,
    source: SourceDescriptor,
    format: ColorFormat,
    lazy: bool,
    context: FrameContext,
    metadata: RwLock<Metadata>,
    state: RwLock<Residency>,
    load_lock: Mutex<()>,
    access_count: AtomicU64,
}

#[derive(Default)]
struct Residency {
    buffer: Option<Arc<DecodedBuffer>>,
    size_bytes: usize,
    last_access: Option<Instant>,
}

impl Frame {
    /// Create a frame bound to the process-wide manager.
    pub fn new(source: SourceDescriptor, options: FrameOptions) -> Self {
        Self::with_context(source, options, &FrameContext::global())
    }

    /// Create a frame bound to an explicit manager and backends.
    ///
    /// A non-lazy inline frame materializes immediately.
    pub fn with_context(
        source: SourceDescriptor,
        options: FrameOptions,
        context: &FrameContext,
    ) -> Self {
        let inner = Arc::new(FrameInner {
            handle: FrameHandle::next(),
            source,
            format: options.format,
            lazy: options.lazy,
            context: context.clone(),
            metadata: RwLock::new(options.metadata),
            state: RwLock::new(Residency::default()),
            load_lock: Mutex::new(()),
            access_count: AtomicU64::new(0),
        });

        let weak: Weak<dyn Evictable> = Arc::downgrade(&inner) as Weak<dyn Evictable>;
        context.manager().register(inner.handle, weak);

        let frame = Frame { inner };
        if frame.inner.source.is_inline() && !frame.inner.lazy {
            if let Err(e) = frame.materialize() {
                warn!(frame = %frame.handle(), error = %e, "eager materialization failed");
            }
        }
        frame
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    /// Return the decoded buffer, decoding it first if it is not resident.
    ///
    /// A hit refreshes the frame's LRU position. A miss decodes without
    /// holding any manager lock, converts to the frame's color format
    /// (falling back to the decoded format if conversion is unsupported),
    /// then registers the new resident bytes, which may evict other frames.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the source cannot be reached
    /// - `DecodeFailed` if no backend could decode it
    pub fn materialize(&self) -> Result<Arc<DecodedBuffer>> {
        if let Some(buffer) = self.inner.touch() {
            self.record_hit(&buffer);
            return Ok(buffer);
        }

        let _load = self.inner.load_lock.lock();

        // Another caller may have finished decoding while we waited.
        if let Some(buffer) = self.inner.touch() {
            self.record_hit(&buffer);
            return Ok(buffer);
        }

        let manager = self.inner.context.manager();
        manager.counters().record_miss();

        let decoded = self
            .inner
            .source
            .decode(self.inner.context.backends())
            .map_err(|e| {
                manager.counters().record_decode_failure();
                debug!(frame = %self.inner.handle, source = ?self.inner.source, error = %e, "decode failed");
                e
            })?;

        let buffer = Arc::new(self.inner.conform(decoded));
        let size = buffer.size_bytes();
        {
            let mut state = self.inner.state.write();
            state.buffer = Some(Arc::clone(&buffer));
            state.size_bytes = size;
            state.last_access = Some(Instant::now());
        }
        self.inner.access_count.fetch_add(1, Ordering::Relaxed);

        debug!(
            frame = %self.inner.handle,
            source = self.inner.source.kind(),
            size,
            checksum = buffer.checksum(),
            "materialized"
        );

        manager.note_materialized(self.inner.handle, size);
        Ok(buffer)
    }

    fn record_hit(&self, buffer: &DecodedBuffer) {
        let manager = self.inner.context.manager();
        manager.counters().record_hit();
        manager.note_materialized(self.inner.handle, buffer.size_bytes());
    }

    /// Release the buffer if this frame is lazy.
    ///
    /// Returns `true` if a buffer was released. Non-lazy frames are left
    /// untouched; only the manager can reclaim them.
    pub fn dematerialize(&self) -> bool {
        if !self.inner.lazy {
            return false;
        }

        let _load = self.inner.load_lock.lock();
        match self.inner.release() {
            Some(size) => {
                self.inner.context.manager().note_dematerialized(self.inner.handle);
                debug!(frame = %self.inner.handle, size, "dematerialized");
                true
            }
            None => false,
        }
    }

    /// Have the manager evict this frame regardless of the lazy flag.
    ///
    /// The source descriptor survives, so a later `materialize` rebuilds the
    /// same buffer.
    pub fn force_evict(&self) -> bool {
        self.inner.context.manager().evict(self.inner.handle)
    }

    // ========================================================================
    // Derived operations
    // ========================================================================

    /// Encode the buffer to `path`, materializing first.
    pub fn save(&self, path: impl AsRef<Path>, format: Option<EncodeFormat>) -> Result<()> {
        let buffer = self.materialize()?;
        self.inner
            .context
            .backends()
            .codec
            .encode(&buffer, path.as_ref(), format)
    }

    /// A new inline frame holding a resized copy of this frame's pixels.
    pub fn resize(&self, width: u32, height: u32) -> Result<Frame> {
        let buffer = self.materialize()?;
        let resized = self
            .inner
            .context
            .backends()
            .codec
            .resize(&buffer, width, height)?;

        let mut metadata = self.metadata();
        metadata.remove("shape");
        Ok(self.derive(resized, metadata))
    }

    /// A new inline frame holding a copy of this frame's pixels.
    pub fn copy(&self) -> Result<Frame> {
        let buffer = self.materialize()?;
        Ok(self.derive(DecodedBuffer::clone(&buffer), self.metadata()))
    }

    fn derive(&self, buffer: DecodedBuffer, metadata: Metadata) -> Frame {
        let options = FrameOptions {
            format: self.inner.format,
            lazy: self.inner.lazy,
            metadata,
        };
        Frame::with_context(SourceDescriptor::inline(buffer), options, &self.inner.context)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn handle(&self) -> FrameHandle {
        self.inner.handle
    }

    #[inline]
    pub fn source(&self) -> &SourceDescriptor {
        &self.inner.source
    }

    #[inline]
    pub fn format(&self) -> ColorFormat {
        self.inner.format
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.inner.lazy
    }

    #[inline]
    pub fn context(&self) -> &FrameContext {
        &self.inner.context
    }

    pub fn is_materialized(&self) -> bool {
        self.inner.is_resident()
    }

    /// Bytes held by the resident buffer, 0 when not materialized.
    pub fn resident_bytes(&self) -> usize {
        self.inner.state.read().size_bytes
    }

    /// When the resident buffer was last handed out, `None` when not
    /// materialized.
    pub fn last_access(&self) -> Option<Instant> {
        let state = self.inner.state.read();
        state.buffer.as_ref().and(state.last_access)
    }

    /// Number of successful `materialize` calls over the frame's lifetime.
    pub fn access_count(&self) -> u64 {
        self.inner.access_count.load(Ordering::Relaxed)
    }

    /// Dimensions without forcing a decode.
    ///
    /// Taken from the resident buffer, else from the `"shape"` metadata
    /// hint, else `None`.
    pub fn shape(&self) -> Option<Shape> {
        if let Some(buffer) = &self.inner.state.read().buffer {
            return Some(buffer.shape());
        }
        shape_hint(self.inner.metadata.read().get("shape")?, self.inner.format)
    }

    pub fn metadata(&self) -> Metadata {
        self.inner.metadata.read().clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<Value> {
        self.inner.metadata.read().get(key).cloned()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.metadata.write().insert(key.into(), value.into());
    }
}

impl FrameInner {
    /// Hand out the resident buffer, refreshing access bookkeeping.
    fn touch(&self) -> Option<Arc<DecodedBuffer>> {
        let mut state = self.state.write();
        let buffer = state.buffer.clone()?;
        state.last_access = Some(Instant::now());
        self.access_count.fetch_add(1, Ordering::Relaxed);
        Some(buffer)
    }

    /// Drop the resident buffer, returning its size if one was held.
    fn release(&self) -> Option<usize> {
        let mut state = self.state.write();
        let buffer = state.buffer.take()?;
        state.size_bytes = 0;
        state.last_access = None;
        drop(state);
        Some(buffer.size_bytes())
    }

    fn conform(&self, decoded: DecodedBuffer) -> DecodedBuffer {
        if decoded.format() == self.format {
            return decoded;
        }
        match self.context.backends().codec.convert(&decoded, self.format) {
            Ok(converted) => converted,
            Err(e) => {
                warn!(
                    frame = %self.handle,
                    from = %decoded.format(),
                    to = %self.format,
                    error = %e,
                    "color conversion failed, keeping decoded format"
                );
                decoded
            }
        }
    }
}

impl Evictable for FrameInner {
    fn handle(&self) -> FrameHandle {
        self.handle
    }

    fn is_resident(&self) -> bool {
        self.state.read().buffer.is_some()
    }

    fn force_evict(&self) -> usize {
        self.release().unwrap_or(0)
    }
}

impl Drop for FrameInner {
    fn drop(&mut self) {
        self.context.manager().unregister(self.handle);
    }
}

fn shape_hint(value: &Value, format: ColorFormat) -> Option<Shape> {
    let dims = value.as_array()?;
    let dim = |i: usize| dims.get(i).and_then(Value::as_u64);
    let height = u32::try_from(dim(0)?).ok()?;
    let width = u32::try_from(dim(1)?).ok()?;
    let channels = match dims.len() {
        2 => format.channels(),
        3 => u8::try_from(dim(2)?).ok()?,
        _ => return None,
    };
    Some(Shape::new(height, width, channels))
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("handle", &self.inner.handle)
            .field("source", &self.inner.source)
            .field("format", &self.inner.format)
            .field("lazy", &self.inner.lazy)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ManagerConfig;
    use crate::manager::MemoryManager;
    use crate::common::Error;
    use crate::source::{Backends, ImageCodec, ImageRsCodec, VideoSource};
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Video source that fills frame `i` with byte `i` and counts decodes.
    struct CountingVideo {
        decodes: AtomicUsize,
        delay: Duration,
    }

    impl VideoSource for CountingVideo {
        fn extract_frame(&self, _path: &Path, index: usize) -> Result<DecodedBuffer> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            DecodedBuffer::new(vec![index as u8; 12], Shape::new(2, 2, 3), ColorFormat::Rgb)
        }

        fn frame_count(&self, _path: &Path) -> Result<usize> {
            Ok(256)
        }
    }

    /// Codec that counts conversions and refuses every one of them.
    struct NoConvertCodec {
        conversions: AtomicUsize,
    }

    impl ImageCodec for NoConvertCodec {
        fn decode(&self, path: &Path) -> Result<DecodedBuffer> {
            ImageRsCodec.decode(path)
        }

        fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedBuffer> {
            ImageRsCodec.decode_bytes(bytes)
        }

        fn encode(
            &self,
            buffer: &DecodedBuffer,
            path: &Path,
            format: Option<EncodeFormat>,
        ) -> Result<()> {
            ImageRsCodec.encode(buffer, path, format)
        }

        fn convert(&self, buffer: &DecodedBuffer, to: ColorFormat) -> Result<DecodedBuffer> {
            self.conversions.fetch_add(1, Ordering::SeqCst);
            Err(Error::UnsupportedConversion(format!("{} -> {}", buffer.format(), to)))
        }

        fn resize(&self, buffer: &DecodedBuffer, width: u32, height: u32) -> Result<DecodedBuffer> {
            ImageRsCodec.resize(buffer, width, height)
        }
    }

    fn test_context() -> FrameContext {
        FrameContext::with_manager(MemoryManager::new(ManagerConfig::default()))
    }

    fn counting_context(delay: Duration) -> (FrameContext, Arc<CountingVideo>) {
        let video = Arc::new(CountingVideo {
            decodes: AtomicUsize::new(0),
            delay,
        });
        let backends = Backends::default().with_video(video.clone());
        let context = FrameContext::new(
            MemoryManager::new(ManagerConfig::default()),
            Arc::new(backends),
        );
        (context, video)
    }

    fn inline_frame(context: &FrameContext, lazy: bool) -> Frame {
        let pixels =
            DecodedBuffer::new((0..12).collect(), Shape::new(2, 2, 3), ColorFormat::Rgb).unwrap();
        Frame::with_context(
            SourceDescriptor::inline(pixels),
            FrameOptions::new().lazy(lazy),
            context,
        )
    }

    fn video_path() -> (NamedTempFile, PathBuf) {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        (file, path)
    }

    #[test]
    fn test_lazy_file_frame_starts_unmaterialized() {
        let context = test_context();
        let frame = Frame::with_context(
            SourceDescriptor::file("/not/decoded/yet.png"),
            FrameOptions::new(),
            &context,
        );

        assert!(!frame.is_materialized());
        assert_eq!(frame.resident_bytes(), 0);
        assert_eq!(frame.last_access(), None);
        assert_eq!(context.manager().resident_count(), 0);
    }

    #[test]
    fn test_eager_inline_frame_materializes_on_construction() {
        let context = test_context();
        let frame = inline_frame(&context, false);

        assert!(frame.is_materialized());
        assert_eq!(frame.resident_bytes(), 12);
        assert!(context.manager().is_resident(frame.handle()));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let context = test_context();
        let frame = inline_frame(&context, true);

        let first = frame.materialize().unwrap();
        let second = frame.materialize().unwrap();

        assert_eq!(first.as_slice(), second.as_slice());
        assert_eq!(frame.resident_bytes(), 12);
        assert_eq!(context.manager().resident_bytes(), 12);
        assert_eq!(frame.access_count(), 2);

        let counters = context.manager().counters().snapshot();
        assert_eq!(counters.cache_misses, 1);
        assert_eq!(counters.cache_hits, 1);
    }

    #[test]
    fn test_dematerialize_respects_lazy_flag() {
        let context = test_context();

        let pinned = inline_frame(&context, false);
        assert!(!pinned.dematerialize());
        assert!(pinned.is_materialized());

        let lazy = inline_frame(&context, true);
        lazy.materialize().unwrap();
        assert!(lazy.dematerialize());
        assert!(!lazy.is_materialized());
        assert_eq!(lazy.resident_bytes(), 0);
        assert!(!context.manager().is_resident(lazy.handle()));
    }

    #[test]
    fn test_force_evict_ignores_lazy_flag() {
        let context = test_context();
        let frame = inline_frame(&context, false);

        assert!(frame.force_evict());
        assert!(!frame.is_materialized());
        assert_eq!(context.manager().resident_count(), 0);

        // Already released: no-op.
        assert!(!frame.force_evict());
    }

    #[test]
    fn test_inline_round_trip_after_eviction() {
        let context = test_context();
        let frame = inline_frame(&context, true);

        let before = frame.materialize().unwrap();
        frame.force_evict();
        let after = frame.materialize().unwrap();

        assert_eq!(before.as_slice(), after.as_slice());
        assert_eq!(before.checksum(), after.checksum());
    }

    #[test]
    fn test_conversion_to_declared_format() {
        let context = test_context();
        let pixels =
            DecodedBuffer::new(vec![1, 2, 3], Shape::new(1, 1, 3), ColorFormat::Rgb).unwrap();
        let frame = Frame::with_context(
            SourceDescriptor::inline(pixels),
            FrameOptions::new().format(ColorFormat::Bgr),
            &context,
        );

        let buffer = frame.materialize().unwrap();
        assert_eq!(buffer.format(), ColorFormat::Bgr);
        assert_eq!(buffer.as_slice(), &[3, 2, 1]);

        // The caller's array is untouched.
        match frame.source() {
            SourceDescriptor::InlineArray(original) => assert_eq!(original.as_slice(), &[1, 2, 3]),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_failed_conversion_keeps_decoded_buffer() {
        let codec = Arc::new(NoConvertCodec {
            conversions: AtomicUsize::new(0),
        });
        let backends = Backends::default().with_codec(codec.clone());
        let context = FrameContext::new(
            MemoryManager::new(ManagerConfig::default()),
            Arc::new(backends),
        );
        let pixels =
            DecodedBuffer::new(vec![1, 2, 3], Shape::new(1, 1, 3), ColorFormat::Rgb).unwrap();
        let frame = Frame::with_context(
            SourceDescriptor::inline(pixels),
            FrameOptions::new().format(ColorFormat::Gray),
            &context,
        );

        let buffer = frame.materialize().unwrap();

        assert_eq!(codec.conversions.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.format(), ColorFormat::Rgb);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
        assert_eq!(frame.resident_bytes(), 3);
        assert_eq!(context.manager().resident_bytes(), 3);
        assert!(context.manager().is_resident(frame.handle()));
    }

    #[test]
    fn test_missing_file_surfaces_source_unavailable() {
        let context = test_context();
        let frame = Frame::with_context(
            SourceDescriptor::file("/definitely/not/here.png"),
            FrameOptions::new(),
            &context,
        );

        let err = frame.materialize().unwrap_err();
        assert!(err.is_source_unavailable());
        assert!(!frame.is_materialized());
        assert_eq!(context.manager().counters().snapshot().decode_failures, 1);
    }

    #[test]
    fn test_shape_without_materializing() {
        let context = test_context();
        let frame = Frame::with_context(
            SourceDescriptor::file("/not/decoded/yet.png"),
            FrameOptions::new()
                .format(ColorFormat::Gray)
                .with_metadata("shape", serde_json::json!([480, 640])),
            &context,
        );

        assert_eq!(frame.shape(), Some(Shape::new(480, 640, 1)));
        assert!(!frame.is_materialized());

        let bare = Frame::with_context(
            SourceDescriptor::file("/not/decoded/yet.png"),
            FrameOptions::new(),
            &context,
        );
        assert_eq!(bare.shape(), None);
    }

    #[test]
    fn test_shape_prefers_buffer() {
        let context = test_context();
        let frame = inline_frame(&context, true);
        frame.set_metadata("shape", serde_json::json!([99, 99, 3]));

        assert_eq!(frame.shape(), Some(Shape::new(99, 99, 3)));
        frame.materialize().unwrap();
        assert_eq!(frame.shape(), Some(Shape::new(2, 2, 3)));
    }

    #[test]
    fn test_copy_and_resize_are_inline() {
        let context = test_context();
        let frame = inline_frame(&context, true);
        frame.set_metadata("shape", serde_json::json!([2, 2, 3]));

        let copy = frame.copy().unwrap();
        assert!(copy.source().is_inline());
        assert_ne!(copy.handle(), frame.handle());
        assert_eq!(copy.materialize().unwrap().as_slice(), frame.materialize().unwrap().as_slice());

        let resized = frame.resize(4, 6).unwrap();
        assert!(resized.source().is_inline());
        assert_eq!(resized.metadata_value("shape"), None);
        assert_eq!(resized.materialize().unwrap().shape(), Shape::new(6, 4, 3));
    }

    #[test]
    fn test_save_writes_file() {
        let context = test_context();
        let frame = inline_frame(&context, true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        frame.save(&path, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_drop_unregisters_from_manager() {
        let context = test_context();
        let frame = inline_frame(&context, false);
        let handle = frame.handle();
        assert!(context.manager().is_resident(handle));

        let clone = frame.clone();
        drop(frame);
        assert!(context.manager().is_resident(handle));

        drop(clone);
        assert!(!context.manager().is_resident(handle));
        assert_eq!(context.manager().registered_count(), 0);
    }

    #[test]
    fn test_concurrent_materialize_decodes_once() {
        let (context, video) = counting_context(Duration::from_millis(50));
        let (_file, path) = video_path();
        let frame = Frame::with_context(SourceDescriptor::video(&path, 7), FrameOptions::new(), &context);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frame = frame.clone();
                thread::spawn(move || frame.materialize().unwrap())
            })
            .collect();

        for handle in handles {
            let buffer = handle.join().unwrap();
            assert_eq!(buffer.as_slice()[0], 7);
        }

        assert_eq!(video.decodes.load(Ordering::SeqCst), 1);
        assert_eq!(context.manager().resident_count(), 1);
    }

    #[test]
    fn test_video_frame_reloads_after_eviction() {
        let (context, video) = counting_context(Duration::ZERO);
        let (_file, path) = video_path();
        let frame = Frame::with_context(SourceDescriptor::video(&path, 3), FrameOptions::new(), &context);

        frame.materialize().unwrap();
        frame.force_evict();
        let buffer = frame.materialize().unwrap();

        assert_eq!(buffer.as_slice()[0], 3);
        assert_eq!(video.decodes.load(Ordering::SeqCst), 2);
    }
}
