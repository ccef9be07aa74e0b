//! Core type definitions for framecache.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// COLOR FORMAT
// ============================================================================

/// Channel order of an 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    /// Red, green, blue (3 channels).
    #[default]
    Rgb,
    /// Blue, green, red (3 channels).
    Bgr,
    /// Single luma channel.
    Gray,
}

impl ColorFormat {
    /// Number of interleaved channels per pixel.
    #[inline]
    pub fn channels(self) -> u8 {
        match self {
            ColorFormat::Rgb | ColorFormat::Bgr => 3,
            ColorFormat::Gray => 1,
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorFormat::Rgb => "RGB",
            ColorFormat::Bgr => "BGR",
            ColorFormat::Gray => "GRAY",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SHAPE
// ============================================================================

/// Dimensions of a pixel buffer, row-major `(height, width, channels)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
}

impl Shape {
    /// Create a new shape.
    #[inline]
    pub const fn new(height: u32, width: u32, channels: u8) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of bytes an 8-bit buffer of this shape occupies.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

// ============================================================================
// DECODED BUFFER
// ============================================================================

/// An owned, sized block of 8-bit interleaved pixel data.
///
/// The length of `data` always equals `shape.byte_len()`; the constructor
/// rejects anything else.
///
/// # Example
/// ```
/// use framecache_core::{ColorFormat, DecodedBuffer, Shape};
///
/// let buffer = DecodedBuffer::new(vec![1, 2, 3], Shape::new(1, 1, 3), ColorFormat::Bgr).unwrap();
/// assert_eq!(buffer.as_slice(), &[1, 2, 3]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedBuffer {
    data: Vec<u8>,
    shape: Shape,
    format: ColorFormat,
}

impl DecodedBuffer {
    /// Wrap raw pixel data.
    ///
    /// # Errors
    /// `InvalidArgument` if the data length does not match the shape, or the
    /// shape's channel count does not match the format.
    pub fn new(data: Vec<u8>, shape: Shape, format: ColorFormat) -> Result<Self> {
        if data.len() != shape.byte_len() {
            return Err(Error::InvalidArgument(format!(
                "buffer of {} bytes does not match shape {}",
                data.len(),
                shape
            )));
        }
        if shape.channels != format.channels() {
            return Err(Error::InvalidArgument(format!(
                "shape {} has {} channels but format {} needs {}",
                shape,
                shape.channels,
                format,
                format.channels()
            )));
        }
        Ok(Self {
            data,
            shape,
            format,
        })
    }

    /// Create a zero-filled buffer.
    pub fn zeros(shape: Shape, format: ColorFormat) -> Self {
        let shape = Shape::new(shape.height, shape.width, format.channels());
        Self {
            data: vec![0u8; shape.byte_len()],
            shape,
            format,
        }
    }

    /// Get immutable slice of pixel data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.shape.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.shape.height
    }

    /// Bytes of pixel data held by this buffer.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// CRC32 of the pixel data.
    pub fn checksum(&self) -> u32 {
        crc32fast::hash(&self.data)
    }
}

impl fmt::Debug for DecodedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedBuffer")
            .field("shape", &self.shape)
            .field("format", &self.format)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
