//! Harris / Noble corner detection on images.
//!
//! This crate wraps [`harris_corners_core`] with what a measurement tool
//! needs around the detector:
//! - re-exports of the core detector types;
//! - (feature `image`) adapters from `image::DynamicImage`, file decoding and
//!   square corner markers;
//! - distances of the corners from a reference point;
//! - a JSON config/report pair used by the `harris-corners` CLI.
//!
//! ## Quickstart
//!
//! ```no_run
//! use harris_corners::{detect, measure, HarrisDetector, HarrisParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = HarrisDetector::new(HarrisParams::default())?;
//! let img = detect::open_image("frame.png")?;
//! let corners = detect::detect_image(&img, &detector)?;
//! for (c, d) in corners.iter().zip(measure::distances_from_origin(&corners)) {
//!     println!("({}, {}) at {d:.2} px from the origin", c.x, c.y);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `harris_corners::core`: the detector crate itself.
//! - `harris_corners::detect` (feature `image`): `DynamicImage` adapters.
//! - `harris_corners::markers` (feature `image`): drawing corner markers.
//! - `harris_corners::measure`: corner distances.
//! - `harris_corners::io`: JSON config and report.

pub use harris_corners_core as core;

pub use harris_corners_core::{
    CornerMeasure, CornerPoint, DetectError, DetectStage, DetectTrace, HarrisDetector,
    HarrisParams, ImageView, PixelFormat,
};

pub mod io;
pub mod measure;

#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
pub mod markers;
