//! Video frame extraction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{ColorFormat, DecodedBuffer, Error, Result, Shape};

/// Random access to individual frames of a video file.
pub trait VideoSource: Send + Sync {
    /// Decode frame `index` (zero-based).
    ///
    /// # Errors
    /// `SourceUnavailable` for a missing file or an index past the end,
    /// `DecodeFailed` if the stream cannot be decoded.
    fn extract_frame(&self, path: &Path, index: usize) -> Result<DecodedBuffer>;

    fn frame_count(&self, path: &Path) -> Result<usize>;
}

/// [`VideoSource`] that shells out to the `ffmpeg` and `ffprobe` binaries.
///
/// Every extraction spawns one `ffprobe` for geometry and one `ffmpeg` that
/// emits a single raw `rgb24` frame on stdout. Frame counts need a full
/// demux, so they are cached per path until the file's mtime changes.
#[derive(Debug)]
pub struct FfmpegVideoSource {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    counts: Mutex<HashMap<PathBuf, CachedCount>>,
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    modified: Option<SystemTime>,
    frames: usize,
}

impl FfmpegVideoSource {
    /// Use `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            counts: Mutex::new(HashMap::new()),
        }
    }

    fn cached_count(&self, path: &Path) -> Option<usize> {
        let modified = modified_time(path);
        let counts = self.counts.lock();
        let cached = counts.get(path)?;
        (cached.modified == modified).then_some(cached.frames)
    }

    fn remember_count(&self, path: &Path, frames: usize) {
        let entry = CachedCount {
            modified: modified_time(path),
            frames,
        };
        self.counts.lock().insert(path.to_path_buf(), entry);
    }

    fn probe(&self, path: &Path, entries: &str, extra: &[&str]) -> Result<String> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(extra)
            .args(["-show_entries", entries, "-of", "csv=p=0:s=x"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::DecodeFailed(format!("failed to spawn ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(Error::DecodeFailed(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        let out = self.probe(path, "stream=width,height", &[])?;
        parse_dimensions(&out).ok_or_else(|| {
            Error::DecodeFailed(format!("unexpected ffprobe geometry {:?}", out))
        })
    }
}

impl Default for FfmpegVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for FfmpegVideoSource {
    fn extract_frame(&self, path: &Path, index: usize) -> Result<DecodedBuffer> {
        if !path.exists() {
            return Err(Error::SourceUnavailable(format!(
                "video not found: {}",
                path.display()
            )));
        }

        let count = self.frame_count(path)?;
        if index >= count {
            return Err(Error::SourceUnavailable(format!(
                "frame {} out of range for {} ({} frames)",
                index,
                path.display(),
                count
            )));
        }

        let (width, height) = self.dimensions(path)?;
        let select = format!("select=eq(n\\,{})", index);

        debug!(path = %path.display(), index, "extracting video frame");

        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vf", &select, "-vsync", "0", "-frames:v", "1"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::DecodeFailed(format!("failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(Error::DecodeFailed(format!(
                "ffmpeg failed on {} frame {}: {}",
                path.display(),
                index,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let shape = Shape::new(height, width, 3);
        let mut data = output.stdout;
        if data.len() < shape.byte_len() {
            return Err(Error::DecodeFailed(format!(
                "ffmpeg returned {} bytes, expected {}",
                data.len(),
                shape.byte_len()
            )));
        }
        data.truncate(shape.byte_len());
        DecodedBuffer::new(data, shape, ColorFormat::Rgb)
    }

    fn frame_count(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::SourceUnavailable(format!(
                "video not found: {}",
                path.display()
            )));
        }
        if let Some(frames) = self.cached_count(path) {
            return Ok(frames);
        }

        let out = self.probe(path, "stream=nb_read_packets", &["-count_packets"])?;
        let frames = out.parse().map_err(|_| {
            Error::DecodeFailed(format!("unexpected ffprobe frame count {:?}", out))
        })?;
        self.remember_count(path, frames);
        Ok(frames)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn parse_dimensions(out: &str) -> Option<(u32, u32)> {
    let line = out.lines().next()?;
    let (w, h) = line.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("640x480"), Some((640, 480)));
        assert_eq!(parse_dimensions("1920x1080\n"), Some((1920, 1080)));
        assert_eq!(parse_dimensions("garbage"), None);
    }

    #[test]
    fn test_missing_video() {
        let source = FfmpegVideoSource::new();
        let path = Path::new("/definitely/not/here.mp4");

        assert!(source.frame_count(path).unwrap_err().is_source_unavailable());
        assert!(source.extract_frame(path, 0).unwrap_err().is_source_unavailable());
    }

    #[test]
    fn test_missing_binary_is_decode_failure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = FfmpegVideoSource::with_binaries("/no/such/ffmpeg", "/no/such/ffprobe");

        let err = source.frame_count(file.path()).unwrap_err();
        assert!(matches!(err, Error::DecodeFailed(_)));
    }

    #[test]
    fn test_frame_count_is_cached_per_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // Unrunnable binaries: any probe would fail with DecodeFailed.
        let source = FfmpegVideoSource::with_binaries("/no/such/ffmpeg", "/no/such/ffprobe");
        source.remember_count(file.path(), 12);

        assert_eq!(source.frame_count(file.path()).unwrap(), 12);
        let err = source.extract_frame(file.path(), 12).unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn test_cached_count_dropped_when_file_changes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = FfmpegVideoSource::with_binaries("/no/such/ffmpeg", "/no/such/ffprobe");
        source.counts.lock().insert(
            file.path().to_path_buf(),
            CachedCount {
                modified: Some(SystemTime::UNIX_EPOCH),
                frames: 12,
            },
        );

        assert_eq!(source.cached_count(file.path()), None);
        assert!(source.frame_count(file.path()).is_err());
    }
}
