//! Still-image codec capability and its `image`-crate implementation.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageError, Luma, Rgb};

use crate::common::{ColorFormat, DecodedBuffer, Error, Result, Shape};

/// Container format for [`ImageCodec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    Png,
    Jpeg,
    Bmp,
}

impl EncodeFormat {
    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(EncodeFormat::Png),
            "jpg" | "jpeg" => Some(EncodeFormat::Jpeg),
            "bmp" => Some(EncodeFormat::Bmp),
            _ => None,
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            EncodeFormat::Png => image::ImageFormat::Png,
            EncodeFormat::Jpeg => image::ImageFormat::Jpeg,
            EncodeFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Decode, encode and transform still images.
///
/// `convert` may fail with `UnsupportedConversion`; frames treat that as
/// non-fatal and keep the unconverted buffer.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedBuffer>;

    fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedBuffer>;

    /// Write `buffer` to `path`. With no explicit format the extension of
    /// `path` decides.
    fn encode(&self, buffer: &DecodedBuffer, path: &Path, format: Option<EncodeFormat>)
        -> Result<()>;

    fn convert(&self, buffer: &DecodedBuffer, to: ColorFormat) -> Result<DecodedBuffer>;

    fn resize(&self, buffer: &DecodedBuffer, width: u32, height: u32) -> Result<DecodedBuffer>;
}

/// [`ImageCodec`] backed by the `image` crate.
///
/// Decoded images come back as `Rgb`, or `Gray` when the file itself is
/// single-channel. Alpha is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsCodec;

impl ImageRsCodec {
    pub fn new() -> Self {
        ImageRsCodec
    }
}

impl ImageCodec for ImageRsCodec {
    fn decode(&self, path: &Path) -> Result<DecodedBuffer> {
        let img = image::open(path).map_err(|e| match e {
            ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Error::SourceUnavailable(format!("{}: {}", path.display(), io))
            }
            other => Error::DecodeFailed(format!("{}: {}", path.display(), other)),
        })?;
        from_dynamic(img)
    }

    fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedBuffer> {
        let img = image::load_from_memory(bytes).map_err(|e| Error::DecodeFailed(e.to_string()))?;
        from_dynamic(img)
    }

    fn encode(
        &self,
        buffer: &DecodedBuffer,
        path: &Path,
        format: Option<EncodeFormat>,
    ) -> Result<()> {
        let format = match format {
            Some(format) => format,
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(EncodeFormat::from_extension)
                .ok_or_else(|| {
                    Error::EncodeFailed(format!("cannot infer format for {}", path.display()))
                })?,
        };

        // Encoders expect RGB channel order.
        let (data, color) = match buffer.format() {
            ColorFormat::Rgb => (buffer.as_slice().to_vec(), ExtendedColorType::Rgb8),
            ColorFormat::Bgr => (swap_red_blue(buffer.as_slice()), ExtendedColorType::Rgb8),
            ColorFormat::Gray => (buffer.as_slice().to_vec(), ExtendedColorType::L8),
        };

        image::save_buffer_with_format(
            path,
            &data,
            buffer.width(),
            buffer.height(),
            color,
            format.image_format(),
        )
        .map_err(|e| Error::EncodeFailed(format!("{}: {}", path.display(), e)))
    }

    fn convert(&self, buffer: &DecodedBuffer, to: ColorFormat) -> Result<DecodedBuffer> {
        let from = buffer.format();
        if from == to {
            return Ok(buffer.clone());
        }

        let src = buffer.as_slice();
        let data = match (from, to) {
            (ColorFormat::Rgb, ColorFormat::Bgr) | (ColorFormat::Bgr, ColorFormat::Rgb) => {
                swap_red_blue(src)
            }
            (ColorFormat::Rgb, ColorFormat::Gray) => luma(src, 0, 2),
            (ColorFormat::Bgr, ColorFormat::Gray) => luma(src, 2, 0),
            (ColorFormat::Gray, ColorFormat::Rgb) | (ColorFormat::Gray, ColorFormat::Bgr) => {
                src.iter().flat_map(|&v| [v, v, v]).collect()
            }
            _ => {
                return Err(Error::UnsupportedConversion(format!("{} -> {}", from, to)));
            }
        };

        let shape = buffer.shape();
        DecodedBuffer::new(data, Shape::new(shape.height, shape.width, to.channels()), to)
            .map_err(|e| Error::UnsupportedConversion(format!("{} -> {}: {}", from, to, e)))
    }

    fn resize(&self, buffer: &DecodedBuffer, width: u32, height: u32) -> Result<DecodedBuffer> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot resize to {}x{}",
                width, height
            )));
        }

        let (w, h) = (buffer.width(), buffer.height());
        let raw = buffer.as_slice().to_vec();
        let mismatch = || Error::InvalidArgument(format!("buffer does not match {}x{}", w, h));

        // Resampling is channel-order agnostic, so BGR goes through the RGB path.
        let data = match buffer.format() {
            ColorFormat::Gray => {
                let img: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(w, h, raw).ok_or_else(mismatch)?;
                imageops::resize(&img, width, height, FilterType::Triangle).into_raw()
            }
            ColorFormat::Rgb | ColorFormat::Bgr => {
                let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(w, h, raw).ok_or_else(mismatch)?;
                imageops::resize(&img, width, height, FilterType::Triangle).into_raw()
            }
        };

        let format = buffer.format();
        DecodedBuffer::new(data, Shape::new(height, width, format.channels()), format)
    }
}

fn from_dynamic(img: DynamicImage) -> Result<DecodedBuffer> {
    let (data, width, height, format) = if img.color().channel_count() <= 2 {
        let gray = img.to_luma8();
        let (w, h) = gray.dimensions();
        (gray.into_raw(), w, h, ColorFormat::Gray)
    } else {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        (rgb.into_raw(), w, h, ColorFormat::Rgb)
    };
    DecodedBuffer::new(data, Shape::new(height, width, format.channels()), format)
        .map_err(|e| Error::DecodeFailed(e.to_string()))
}

fn swap_red_blue(src: &[u8]) -> Vec<u8> {
    src.chunks_exact(3).flat_map(|px| [px[2], px[1], px[0]]).collect()
}

/// ITU-R BT.601 luma; `r` and `b` are the channel offsets of red and blue.
fn luma(src: &[u8], r: usize, b: usize) -> Vec<u8> {
    src.chunks_exact(3)
        .map(|px| {
            let y = 299 * px[r] as u32 + 587 * px[1] as u32 + 114 * px[b] as u32;
            ((y + 500) / 1000) as u8
        })
        .collect()
}
