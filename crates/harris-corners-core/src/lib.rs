//! Dense Harris / Noble corner detection on raw pixel buffers.
//!
//! The detector runs a fixed pipeline over a borrowed [`ImageView`]:
//!
//! 1. reduce the source to 8-bit luminance (borrowed for `Indexed8`);
//! 2. 3×3 gradients and their products `h²`, `v²`, `h·v`;
//! 3. separable Gaussian smoothing of the three products;
//! 4. per-pixel Harris (`det - k·trace²`) or Noble (`det / (trace + ε)`)
//!    response, kept only above a threshold;
//! 5. non-maximum suppression, returning integer [`CornerPoint`]s in raster
//!    order.
//!
//! The crate has no image-library dependency. Decoding files, drawing
//! markers and the CLI live in the `harris-corners` facade crate.
//!
//! ## Features
//!
//! - `rayon` – run every row-oriented stage in parallel. Output is
//!   bit-identical to the scalar build.
//! - `tracing` – emit a span per stage and expose [`init_tracing`].

mod corner;
mod detector;
mod error;
mod gradient;
mod gray;
mod image;
mod logger;
mod map;
mod nms;
mod response;
mod smooth;

pub use corner::CornerPoint;
pub use detector::{DetectStage, DetectTrace, HarrisDetector, HarrisParams, StageTiming};
pub use error::{ConfigError, DetectError, ImageError};
pub use gradient::gradient_products;
pub use gray::GrayBuffer;
pub use image::{ImageView, PixelFormat};
pub use map::{FloatMap, StructureTensor};
pub use nms::{border_margin, suppress_non_maxima};
pub use response::{corner_response, CornerMeasure, NOBLE_EPSILON};
pub use smooth::{smooth_tensor, GaussianKernel};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_str, init_with_level, parse_level};
