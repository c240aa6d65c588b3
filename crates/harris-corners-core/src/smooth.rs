//! Separable Gaussian smoothing of the gradient products.
//!
//! Each map goes through a horizontal pass into a scratch map and a vertical
//! pass back into the map. Neither pass pads or clamps:
//!
//! - the horizontal pass writes columns `r..w-r` of the scratch map only;
//! - the vertical pass writes rows `r..h-r`, every column, from the scratch.
//!
//! The scratch map starts zeroed and is shared by all three maps, so its
//! left/right bands stay zero. As a result the top/bottom `r` rows of a map
//! keep their raw values and the left/right `r` columns of the interior rows
//! become zero. Downstream thresholds and suppression depend on this exact
//! behaviour; do not "fix" it with border handling.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::map::{FloatMap, StructureTensor};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Normalized, odd-length 1-D Gaussian kernel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianKernel {
    sigma: f64,
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Sample `exp(-x² / 2σ²)` at `x = -r..=r` (`r = size / 2`) and scale
    /// the taps to sum to one.
    pub fn new(sigma: f64, size: usize) -> Result<Self, ConfigError> {
        if size < 3 || size % 2 == 0 {
            return Err(ConfigError::InvalidKernelSize { size });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ConfigError::InvalidSigma { sigma });
        }

        let r = (size / 2) as f64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let x = i as f64 - r;
                (-x * x / two_sigma_sq).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        let weights = raw.into_iter().map(|v| (v / sum) as f32).collect();

        Ok(Self { sigma, weights })
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }
}

#[inline]
fn convolve_row(src: &[f32], dst: &mut [f32], kernel: &[f32]) {
    let r = kernel.len() / 2;
    let w = src.len();
    for x in r..w - r {
        let mut acc = 0.0f32;
        for (k, &kv) in kernel.iter().enumerate() {
            acc += src[x + k - r] * kv;
        }
        dst[x] = acc;
    }
}

fn horizontal_pass(src: &FloatMap, scratch: &mut FloatMap, kernel: &[f32]) {
    let w = src.w;
    if w < kernel.len() {
        return;
    }

    #[cfg(feature = "rayon")]
    scratch
        .data
        .par_chunks_mut(w)
        .zip(src.data.par_chunks(w))
        .for_each(|(dst, row)| convolve_row(row, dst, kernel));

    #[cfg(not(feature = "rayon"))]
    for (dst, row) in scratch.data.chunks_mut(w).zip(src.data.chunks(w)) {
        convolve_row(row, dst, kernel);
    }
}

#[inline]
fn vertical_at(scratch: &FloatMap, x: usize, y: usize, kernel: &[f32]) -> f32 {
    let r = kernel.len() / 2;
    let mut acc = 0.0f32;
    for (k, &kv) in kernel.iter().enumerate() {
        acc += scratch.at(x, y + k - r) * kv;
    }
    acc
}

fn vertical_pass(scratch: &FloatMap, dst: &mut FloatMap, kernel: &[f32]) {
    let (w, h) = (dst.w, dst.h);
    let r = kernel.len() / 2;
    if h < kernel.len() {
        return;
    }

    #[cfg(feature = "rayon")]
    dst.data
        .par_chunks_mut(w)
        .enumerate()
        .filter(|(y, _)| *y >= r && *y < h - r)
        .for_each(|(y, row)| {
            for (x, v) in row.iter_mut().enumerate() {
                *v = vertical_at(scratch, x, y, kernel);
            }
        });

    #[cfg(not(feature = "rayon"))]
    for (y, row) in dst.data.chunks_mut(w).enumerate().take(h - r).skip(r) {
        for (x, v) in row.iter_mut().enumerate() {
            *v = vertical_at(scratch, x, y, kernel);
        }
    }
}

/// Smooth one map in place using `scratch` for the intermediate pass.
///
/// `scratch` must be sized like `map` and is expected to be zero outside the
/// columns the horizontal pass writes.
pub fn smooth_in_place(map: &mut FloatMap, scratch: &mut FloatMap, kernel: &GaussianKernel) {
    debug_assert!(map.same_size(scratch));
    horizontal_pass(map, scratch, kernel.weights());
    vertical_pass(scratch, map, kernel.weights());
}

/// Smooth all three gradient products. `None` disables smoothing.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(tensor, kernel),
        fields(w = tensor.width(), h = tensor.height())
    )
)]
pub fn smooth_tensor(tensor: &mut StructureTensor, kernel: Option<&GaussianKernel>) {
    let Some(kernel) = kernel else {
        return;
    };
    let mut scratch = FloatMap::zeros(tensor.width(), tensor.height());
    smooth_in_place(&mut tensor.xx, &mut scratch, kernel);
    smooth_in_place(&mut tensor.yy, &mut scratch, kernel);
    smooth_in_place(&mut tensor.xy, &mut scratch, kernel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map_from(w: usize, h: usize, f: impl Fn(usize, usize) -> f32) -> FloatMap {
        let mut m = FloatMap::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                m.set(x, y, f(x, y));
            }
        }
        m
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = GaussianKernel::new(1.2, 7).expect("kernel");
        assert_eq!(k.len(), 7);
        assert_eq!(k.radius(), 3);
        let w = k.weights();
        assert_relative_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for i in 0..3 {
            assert_relative_eq!(w[i], w[6 - i], epsilon = 1e-7);
            assert!(w[i] < w[i + 1]);
        }
    }

    #[test]
    fn kernel_matches_sampled_gaussian() {
        let k = GaussianKernel::new(1.0, 3).expect("kernel");
        let e = (-0.5f64).exp();
        let sum = 1.0 + 2.0 * e;
        assert_relative_eq!(k.weights()[0] as f64, e / sum, epsilon = 1e-6);
        assert_relative_eq!(k.weights()[1] as f64, 1.0 / sum, epsilon = 1e-6);
    }

    #[test]
    fn kernel_rejects_bad_sizes() {
        assert_eq!(
            GaussianKernel::new(1.2, 4),
            Err(ConfigError::InvalidKernelSize { size: 4 })
        );
        assert_eq!(
            GaussianKernel::new(1.2, 1),
            Err(ConfigError::InvalidKernelSize { size: 1 })
        );
        assert!(GaussianKernel::new(f64::NAN, 5).is_err());
    }

    #[test]
    fn constant_interior_is_preserved() {
        let k = GaussianKernel::new(1.2, 5).expect("kernel");
        let mut m = map_from(12, 10, |_, _| 50.0);
        let mut scratch = FloatMap::zeros(12, 10);
        smooth_in_place(&mut m, &mut scratch, &k);
        for y in 2..8 {
            for x in 2..10 {
                assert_relative_eq!(m.at(x, y), 50.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn border_bands_follow_two_pass_layout() {
        let k = GaussianKernel::new(1.0, 5).expect("kernel");
        let mut m = map_from(10, 9, |x, y| (x + 10 * y) as f32 + 1.0);
        let raw = m.clone();
        let mut scratch = FloatMap::zeros(10, 9);
        smooth_in_place(&mut m, &mut scratch, &k);

        // Top and bottom bands keep raw values.
        for x in 0..10 {
            for y in [0, 1, 7, 8] {
                assert_eq!(m.at(x, y), raw.at(x, y));
            }
        }
        // Left and right bands of interior rows read zero scratch columns.
        for y in 2..7 {
            for x in [0, 1, 8, 9] {
                assert_eq!(m.at(x, y), 0.0);
            }
        }
        // Interior is a genuine blend; a linear ramp is reproduced exactly.
        assert_relative_eq!(m.at(5, 4), raw.at(5, 4), epsilon = 1e-3);
    }

    #[test]
    fn impulse_spreads_as_outer_product() {
        let k = GaussianKernel::new(1.2, 7).expect("kernel");
        let mut m = FloatMap::zeros(15, 15);
        m.set(7, 7, 1.0);
        let mut scratch = FloatMap::zeros(15, 15);
        smooth_in_place(&mut m, &mut scratch, &k);
        let w = k.weights();
        for dy in 0..7 {
            for dx in 0..7 {
                let v = m.at(4 + dx, 4 + dy);
                assert_relative_eq!(v, w[dx] * w[dy], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn narrow_maps_skip_the_pass_that_does_not_fit() {
        let k = GaussianKernel::new(1.2, 7).expect("kernel");
        let mut m = map_from(5, 12, |_, _| 3.0);
        let mut scratch = FloatMap::zeros(5, 12);
        smooth_in_place(&mut m, &mut scratch, &k);
        // No horizontal pass: scratch is zero, so interior rows become zero.
        assert_eq!(m.at(2, 5), 0.0);
        assert_eq!(m.at(2, 0), 3.0);
    }

    #[test]
    fn disabled_smoothing_is_identity() {
        let mut t = StructureTensor::zeros(6, 6);
        t.xx.set(3, 3, 9.0);
        let before = t.clone();
        smooth_tensor(&mut t, None);
        assert_eq!(t, before);
    }
}
