//! Borrowed pixel buffers with an explicit row stride.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, ImageError};

/// Pixel encoding declared by a source buffer.
///
/// Only the first four variants are accepted by the detector. The remaining
/// ones describe buffers a capture pipeline commonly hands out (raw 16-bit
/// depth frames, 16-bit-per-channel bitmaps) so that they can be wrapped and
/// rejected explicitly instead of being misread.
///
/// Byte order inside a pixel: `Rgb24` is `[R, G, B]`, `Rgb32` is
/// `[R, G, B, X]` with an ignored pad byte, `Argb32` is `[A, R, G, B]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit single channel (grayscale or palette index used as intensity).
    #[serde(alias = "gray8")]
    Indexed8,
    Rgb24,
    Rgb32,
    Argb32,
    /// 16-bit little-endian single channel, e.g. raw depth.
    Gray16,
    Rgb48,
    Argb64,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Indexed8 => 1,
            PixelFormat::Gray16 => 2,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgb32 | PixelFormat::Argb32 => 4,
            PixelFormat::Rgb48 => 6,
            PixelFormat::Argb64 => 8,
        }
    }

    /// Whether the detector can reduce this encoding to luminance.
    #[inline]
    pub const fn is_supported(self) -> bool {
        matches!(
            self,
            PixelFormat::Indexed8 | PixelFormat::Rgb24 | PixelFormat::Rgb32 | PixelFormat::Argb32
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Indexed8 => "indexed8",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgb32 => "rgb32",
            PixelFormat::Argb32 => "argb32",
            PixelFormat::Gray16 => "gray16",
            PixelFormat::Rgb48 => "rgb48",
            PixelFormat::Argb64 => "argb64",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indexed8" | "gray8" => Ok(PixelFormat::Indexed8),
            "rgb24" => Ok(PixelFormat::Rgb24),
            "rgb32" => Ok(PixelFormat::Rgb32),
            "argb32" => Ok(PixelFormat::Argb32),
            "gray16" => Ok(PixelFormat::Gray16),
            "rgb48" => Ok(PixelFormat::Rgb48),
            "argb64" => Ok(PixelFormat::Argb64),
            other => Err(format!("unknown pixel format '{other}'")),
        }
    }
}

/// Immutable, borrowed image buffer.
///
/// Rows are `stride` bytes apart; a row may carry alignment padding beyond
/// `width * bytes_per_pixel`. The detector only reads through this view and
/// never keeps it past the call.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Wrap a strided buffer, checking that every row fits in `data`.
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let row_bytes = width
            .checked_mul(format.bytes_per_pixel())
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if stride < row_bytes {
            return Err(ImageError::StrideTooSmall { stride, row_bytes });
        }
        let expected = stride
            .checked_mul(height - 1)
            .and_then(|v| v.checked_add(row_bytes))
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if data.len() < expected {
            return Err(ImageError::BufferTooSmall {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Wrap a tightly packed buffer (`stride == width * bytes_per_pixel`).
    pub fn packed(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        let stride = width.saturating_mul(format.bytes_per_pixel());
        Self::new(width, height, stride, format, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes of row `y`, without the trailing stride padding.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width * self.format.bytes_per_pixel()]
    }

    /// Bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &'a [u8] {
        let bpp = self.format.bytes_per_pixel();
        let offset = y * self.stride + x * bpp;
        &self.data[offset..offset + bpp]
    }
}

/// A view whose encoding has been checked against the supported set.
///
/// Built only by [`SourcePixels::validate`]; everything downstream matches on
/// these four variants exhaustively.
#[derive(Clone, Copy, Debug)]
pub(crate) enum SourcePixels<'a> {
    Indexed8(ImageView<'a>),
    Rgb24(ImageView<'a>),
    Rgb32(ImageView<'a>),
    Argb32(ImageView<'a>),
}

impl<'a> SourcePixels<'a> {
    pub(crate) fn validate(view: ImageView<'a>) -> Result<Self, DetectError> {
        match view.format {
            PixelFormat::Indexed8 => Ok(SourcePixels::Indexed8(view)),
            PixelFormat::Rgb24 => Ok(SourcePixels::Rgb24(view)),
            PixelFormat::Rgb32 => Ok(SourcePixels::Rgb32(view)),
            PixelFormat::Argb32 => Ok(SourcePixels::Argb32(view)),
            format @ (PixelFormat::Gray16 | PixelFormat::Rgb48 | PixelFormat::Argb64) => {
                Err(DetectError::UnsupportedFormat { format })
            }
        }
    }
}
