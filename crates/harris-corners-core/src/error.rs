use crate::image::PixelFormat;

/// Errors returned by [`crate::HarrisDetector::detect`].
///
/// Detection has a single failure mode: the source encoding is not one the
/// engine can reduce to luminance. It is reported before any map is
/// allocated, so a failed call never produces partial output.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectError {
    #[error("unsupported pixel format of the source image: {format}")]
    UnsupportedFormat { format: PixelFormat },
}

/// Errors produced while building a [`crate::HarrisDetector`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("gaussian kernel size must be odd and at least 3 (got {size})")]
    InvalidKernelSize { size: usize },
    #[error("gaussian sigma must be finite (got {sigma})")]
    InvalidSigma { sigma: f64 },
    #[error("harris sensitivity k must be finite (got {k})")]
    InvalidK { k: f32 },
    #[error("response threshold must be finite (got {threshold})")]
    InvalidThreshold { threshold: f32 },
}

/// Errors produced while wrapping a raw buffer into an [`crate::ImageView`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("row stride {stride} is smaller than one row of pixels ({row_bytes} bytes)")]
    StrideTooSmall { stride: usize, row_bytes: usize },
    #[error("invalid image buffer length (expected at least {expected} bytes, got {got})")]
    BufferTooSmall { expected: usize, got: usize },
}
