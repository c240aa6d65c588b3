//! End-to-end helpers from `image` buffers to corners.

use std::path::{Path, PathBuf};

use harris_corners_core::{
    CornerPoint, DetectError, HarrisDetector, ImageError, ImageView, PixelFormat,
};
use image::{DynamicImage, ImageReader};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced while wrapping a decoded image as an [`ImageView`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageAdaptError {
    #[error("unsupported image color type {color}, expected L8, Rgb8 or Rgba8")]
    Unsupported { color: String },
    #[error(transparent)]
    View(#[from] ImageError),
}

/// Errors produced by [`detect_path`] and [`open_image`].
#[derive(thiserror::Error, Debug)]
pub enum ImageDetectError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Adapt(#[from] ImageAdaptError),
    #[error(transparent)]
    Detect(#[from] DetectError),
}

/// Borrow the pixels of a decoded image without copying.
///
/// `L8` maps to [`PixelFormat::Indexed8`], `Rgb8` to [`PixelFormat::Rgb24`]
/// and `Rgba8` to [`PixelFormat::Rgb32`] (alpha sits in the pad byte).
/// 16-bit buffers are wrapped as `Gray16`, `Rgb48` and `Argb64` so that the
/// detector itself reports them as unsupported. Float buffers have no
/// [`PixelFormat`] and fail here.
pub fn view_from_dynamic(img: &DynamicImage) -> Result<ImageView<'_>, ImageAdaptError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let format = match img {
        DynamicImage::ImageLuma8(_) => PixelFormat::Indexed8,
        DynamicImage::ImageRgb8(_) => PixelFormat::Rgb24,
        DynamicImage::ImageRgba8(_) => PixelFormat::Rgb32,
        DynamicImage::ImageLuma16(_) => PixelFormat::Gray16,
        DynamicImage::ImageRgb16(_) => PixelFormat::Rgb48,
        DynamicImage::ImageRgba16(_) => PixelFormat::Argb64,
        other => {
            return Err(ImageAdaptError::Unsupported {
                color: format!("{:?}", other.color()),
            })
        }
    };
    Ok(ImageView::packed(w, h, format, img.as_bytes())?)
}

/// Decode an image file.
pub fn open_image(path: impl AsRef<Path>) -> Result<DynamicImage, ImageDetectError> {
    let path = path.as_ref();
    let open_err = |source: std::io::Error| ImageDetectError::Open {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?;
    let img = reader.decode()?;
    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Run the detector on a decoded image.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, detector),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_image(
    img: &DynamicImage,
    detector: &HarrisDetector,
) -> Result<Vec<CornerPoint>, ImageDetectError> {
    let view = view_from_dynamic(img)?;
    Ok(detector.detect(&view)?)
}

/// Decode `path` and run the detector on it.
pub fn detect_path(
    path: impl AsRef<Path>,
    detector: &HarrisDetector,
) -> Result<Vec<CornerPoint>, ImageDetectError> {
    let img = open_image(path)?;
    detect_image(&img, detector)
}
