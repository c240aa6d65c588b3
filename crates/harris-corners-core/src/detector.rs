//! Detector facade: configuration, kernel caching and stage orchestration.

use std::fmt;
use std::time::Instant;

use log::{debug, log_enabled, trace, warn, Level};
use serde::{Deserialize, Serialize};

use crate::corner::CornerPoint;
use crate::error::{ConfigError, DetectError};
use crate::gradient::gradient_products;
use crate::gray::reduce_to_gray;
use crate::image::{ImageView, SourcePixels};
use crate::map::FloatMap;
use crate::nms::suppress_non_maxima;
use crate::response::{corner_response, CornerMeasure};
use crate::smooth::{smooth_tensor, GaussianKernel};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tunable parameters of the Harris detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarrisParams {
    /// Corner measure applied to the structure tensor.
    pub measure: CornerMeasure,
    /// Harris sensitivity; only used by [`CornerMeasure::Harris`].
    pub k: f32,
    /// Responses at or below this value are discarded.
    ///
    /// The scale follows the 8-bit intensity range: the gradient products
    /// are in units of intensity², the Harris measure in intensity⁴.
    pub threshold: f32,
    /// Gaussian smoothing sigma. `<= 0` disables smoothing.
    pub sigma: f64,
    /// Gaussian kernel length (odd, at least 3).
    pub kernel_size: usize,
    /// Non-maximum suppression window radius.
    pub suppression: usize,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            measure: CornerMeasure::Harris,
            k: 0.04,
            threshold: 200_000.0,
            sigma: 1.2,
            kernel_size: 7,
            suppression: 3,
        }
    }
}

impl HarrisParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernel_size < 3 || self.kernel_size % 2 == 0 {
            return Err(ConfigError::InvalidKernelSize {
                size: self.kernel_size,
            });
        }
        if !self.sigma.is_finite() {
            return Err(ConfigError::InvalidSigma { sigma: self.sigma });
        }
        if !self.k.is_finite() {
            return Err(ConfigError::InvalidK { k: self.k });
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    fn build_kernel(&self) -> Result<Option<GaussianKernel>, ConfigError> {
        self.validate()?;
        if self.sigma <= 0.0 {
            return Ok(None);
        }
        GaussianKernel::new(self.sigma, self.kernel_size).map(Some)
    }
}

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectStage {
    Validating,
    Reducing,
    Differentiating,
    Smoothing,
    Scoring,
    Suppressing,
}

impl fmt::Display for DetectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectStage::Validating => "validating",
            DetectStage::Reducing => "reducing",
            DetectStage::Differentiating => "differentiating",
            DetectStage::Smoothing => "smoothing",
            DetectStage::Scoring => "scoring",
            DetectStage::Suppressing => "suppressing",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: DetectStage,
    pub ms: f64,
}

/// Corners plus the intermediate response map and per-stage timings.
#[derive(Clone, Debug)]
pub struct DetectTrace {
    pub corners: Vec<CornerPoint>,
    pub response: FloatMap,
    pub timings: Vec<StageTiming>,
}

impl DetectTrace {
    pub fn total_ms(&self) -> f64 {
        self.timings.iter().map(|t| t.ms).sum()
    }
}

struct StageClock {
    started: Instant,
    timings: Vec<StageTiming>,
}

impl StageClock {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            timings: Vec::with_capacity(6),
        }
    }

    fn lap(&mut self, stage: DetectStage) {
        let now = Instant::now();
        let ms = now.duration_since(self.started).as_secs_f64() * 1000.0;
        debug!("{stage} done in {ms:.3} ms");
        self.timings.push(StageTiming { stage, ms });
        self.started = now;
    }
}

/// Harris / Noble corner detector over raw pixel buffers.
///
/// Holds the parameters and the Gaussian kernel derived from them. Detection
/// takes `&self` and allocates all maps per call, so one detector can serve
/// concurrent callers; changing sigma needs `&mut self` and rebuilds the
/// kernel right away.
///
/// ```
/// use harris_corners_core::{HarrisDetector, HarrisParams, ImageView, PixelFormat};
///
/// let (w, h) = (48, 48);
/// let mut pixels = vec![0u8; w * h];
/// for y in 16..32 {
///     for x in 16..32 {
///         pixels[y * w + x] = 255;
///     }
/// }
/// let view = ImageView::packed(w, h, PixelFormat::Indexed8, &pixels).unwrap();
/// let detector = HarrisDetector::new(HarrisParams::default()).unwrap();
/// let corners = detector.detect(&view).unwrap();
/// assert_eq!(corners.len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct HarrisDetector {
    params: HarrisParams,
    kernel: Option<GaussianKernel>,
}

impl HarrisDetector {
    pub fn new(params: HarrisParams) -> Result<Self, ConfigError> {
        let kernel = params.build_kernel()?;
        Ok(Self { params, kernel })
    }

    #[inline]
    pub fn params(&self) -> &HarrisParams {
        &self.params
    }

    /// Cached smoothing kernel; `None` when smoothing is disabled.
    #[inline]
    pub fn kernel(&self) -> Option<&GaussianKernel> {
        self.kernel.as_ref()
    }

    pub fn set_measure(&mut self, measure: CornerMeasure) {
        self.params.measure = measure;
    }

    pub fn set_k(&mut self, k: f32) -> Result<(), ConfigError> {
        if !k.is_finite() {
            return Err(ConfigError::InvalidK { k });
        }
        self.params.k = k;
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: f32) -> Result<(), ConfigError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold { threshold });
        }
        self.params.threshold = threshold;
        Ok(())
    }

    pub fn set_suppression(&mut self, radius: usize) {
        self.params.suppression = radius;
    }

    /// Change sigma and regenerate the kernel. On error nothing changes.
    pub fn set_sigma(&mut self, sigma: f64) -> Result<(), ConfigError> {
        if sigma == self.params.sigma {
            return Ok(());
        }
        let params = HarrisParams {
            sigma,
            ..self.params.clone()
        };
        self.kernel = params.build_kernel()?;
        self.params = params;
        Ok(())
    }

    /// Change the kernel length and regenerate the kernel. On error nothing
    /// changes.
    pub fn set_kernel_size(&mut self, size: usize) -> Result<(), ConfigError> {
        let params = HarrisParams {
            kernel_size: size,
            ..self.params.clone()
        };
        self.kernel = params.build_kernel()?;
        self.params = params;
        Ok(())
    }

    /// Rebuild the kernel from the current parameters.
    pub fn rebuild_kernel(&mut self) -> Result<(), ConfigError> {
        self.kernel = self.params.build_kernel()?;
        Ok(())
    }

    /// Detect corners, returned in raster order.
    pub fn detect(&self, image: &ImageView<'_>) -> Result<Vec<CornerPoint>, DetectError> {
        Ok(self.run(image)?.corners)
    }

    /// Thresholded response map only (zero means "not a candidate").
    pub fn response_map(&self, image: &ImageView<'_>) -> Result<FloatMap, DetectError> {
        Ok(self.run(image)?.response)
    }

    /// Detect corners and keep the response map and stage timings.
    pub fn detect_with_trace(&self, image: &ImageView<'_>) -> Result<DetectTrace, DetectError> {
        self.run(image)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(w = image.width(), h = image.height(), format = %image.format())
        )
    )]
    fn run(&self, image: &ImageView<'_>) -> Result<DetectTrace, DetectError> {
        let p = &self.params;
        let mut clock = StageClock::start();

        let src = SourcePixels::validate(*image).inspect_err(|e| warn!("{e}"))?;
        clock.lap(DetectStage::Validating);

        let gray = reduce_to_gray(src);
        clock.lap(DetectStage::Reducing);

        let mut tensor = gradient_products(&gray);
        drop(gray);
        clock.lap(DetectStage::Differentiating);

        smooth_tensor(&mut tensor, self.kernel.as_ref());
        clock.lap(DetectStage::Smoothing);

        let response = corner_response(&tensor, p.measure, p.k, p.threshold);
        drop(tensor);
        clock.lap(DetectStage::Scoring);
        if log_enabled!(Level::Trace) {
            trace!("{} response cells above threshold", response.count_nonzero());
        }

        let corners = suppress_non_maxima(&response, p.suppression);
        clock.lap(DetectStage::Suppressing);
        debug!(
            "{} corners in {}x{} {} image",
            corners.len(),
            image.width(),
            image.height(),
            image.format()
        );

        Ok(DetectTrace {
            corners,
            response,
            timings: clock.timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    fn square_image(w: usize, h: usize, x0: usize, y0: usize, side: usize) -> Vec<u8> {
        let mut px = vec![20u8; w * h];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                px[y * w + x] = 230;
            }
        }
        px
    }

    #[test]
    fn default_params_match_reference_tool() {
        let p = HarrisParams::default();
        assert_eq!(p.measure, CornerMeasure::Harris);
        assert_eq!(p.k, 0.04);
        assert_eq!(p.threshold, 200_000.0);
        assert_eq!(p.sigma, 1.2);
        assert_eq!(p.kernel_size, 7);
        assert_eq!(p.suppression, 3);
    }

    #[test]
    fn construction_validates_params() {
        let bad = HarrisParams {
            kernel_size: 6,
            ..HarrisParams::default()
        };
        assert_eq!(
            HarrisDetector::new(bad).unwrap_err(),
            ConfigError::InvalidKernelSize { size: 6 }
        );
        let bad = HarrisParams {
            threshold: f32::NAN,
            ..HarrisParams::default()
        };
        assert!(matches!(
            HarrisDetector::new(bad),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn sigma_changes_rebuild_the_kernel() {
        let mut det = HarrisDetector::new(HarrisParams::default()).expect("detector");
        let before = det.kernel().cloned().expect("kernel");
        det.set_sigma(2.0).expect("sigma");
        let after = det.kernel().expect("kernel");
        assert_eq!(after.sigma(), 2.0);
        assert_ne!(before.weights(), after.weights());

        det.set_sigma(0.0).expect("sigma");
        assert!(det.kernel().is_none());

        assert!(det.set_sigma(f64::INFINITY).is_err());
        assert_eq!(det.params().sigma, 0.0);
    }

    #[test]
    fn kernel_size_change_is_atomic() {
        let mut det = HarrisDetector::new(HarrisParams::default()).expect("detector");
        assert!(det.set_kernel_size(8).is_err());
        assert_eq!(det.params().kernel_size, 7);
        assert_eq!(det.kernel().map(|k| k.len()), Some(7));
        det.set_kernel_size(5).expect("size");
        assert_eq!(det.kernel().map(|k| k.len()), Some(5));
    }

    #[test]
    fn finds_the_four_square_corners() {
        let (w, h) = (64, 64);
        let px = square_image(w, h, 20, 24, 20);
        let view = ImageView::packed(w, h, PixelFormat::Indexed8, &px).expect("view");
        let det = HarrisDetector::new(HarrisParams::default()).expect("detector");
        let corners = det.detect(&view).expect("detect");
        assert_eq!(corners.len(), 4, "corners: {corners:?}");
        let expected = [(20, 24), (39, 24), (20, 43), (39, 43)];
        for (c, (ex, ey)) in corners.iter().zip(expected) {
            assert!(
                c.x.abs_diff(ex) <= 2 && c.y.abs_diff(ey) <= 2,
                "corner {c:?} too far from ({ex}, {ey})"
            );
        }
    }

    #[test]
    fn trace_reports_every_stage_in_order() {
        let px = square_image(32, 32, 8, 8, 12);
        let view = ImageView::packed(32, 32, PixelFormat::Indexed8, &px).expect("view");
        let det = HarrisDetector::new(HarrisParams::default()).expect("detector");
        let trace = det.detect_with_trace(&view).expect("detect");
        let stages: Vec<_> = trace.timings.iter().map(|t| t.stage).collect();
        assert_eq!(
            stages,
            vec![
                DetectStage::Validating,
                DetectStage::Reducing,
                DetectStage::Differentiating,
                DetectStage::Smoothing,
                DetectStage::Scoring,
                DetectStage::Suppressing,
            ]
        );
        assert_eq!((trace.response.w, trace.response.h), (32, 32));
        assert!(trace.total_ms() >= 0.0);
        assert_eq!(trace.corners, det.detect(&view).expect("detect"));
    }

    #[test]
    fn unsupported_format_fails_before_any_stage() {
        let px = vec![0u8; 16 * 16 * 6];
        let view = ImageView::packed(16, 16, PixelFormat::Rgb48, &px).expect("view");
        let det = HarrisDetector::new(HarrisParams::default()).expect("detector");
        assert_eq!(
            det.detect(&view).unwrap_err(),
            DetectError::UnsupportedFormat {
                format: PixelFormat::Rgb48
            }
        );
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: HarrisParams =
            serde_json::from_str(r#"{"measure":"noble","threshold":50.0}"#).expect("json");
        assert_eq!(p.measure, CornerMeasure::Noble);
        assert_eq!(p.threshold, 50.0);
        assert_eq!(p.kernel_size, 7);
    }
}
