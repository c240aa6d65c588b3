//! Corner-strength scoring of the smoothed structure tensor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::map::{FloatMap, StructureTensor};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Keeps Noble's measure finite where both derivatives vanish.
pub const NOBLE_EPSILON: f32 = f32::EPSILON;

/// Scalar function of the structure tensor used as corner strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerMeasure {
    /// `det - k·trace²`. Needs the sensitivity `k`.
    #[default]
    Harris,
    /// `det / (trace + ε)`. Parameter-free.
    Noble,
}

impl CornerMeasure {
    /// Evaluate the measure for tensor entries `a = Σh²`, `b = Σv²`,
    /// `c = Σh·v`. `k` is ignored by [`CornerMeasure::Noble`].
    #[inline]
    pub fn evaluate(self, a: f32, b: f32, c: f32, k: f32) -> f32 {
        match self {
            CornerMeasure::Harris => (a * b - c * c) - k * ((a + b) * (a + b)),
            CornerMeasure::Noble => (a * b - c * c) / (a + b + NOBLE_EPSILON),
        }
    }
}

impl fmt::Display for CornerMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CornerMeasure::Harris => f.write_str("harris"),
            CornerMeasure::Noble => f.write_str("noble"),
        }
    }
}

impl FromStr for CornerMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "harris" => Ok(CornerMeasure::Harris),
            "noble" => Ok(CornerMeasure::Noble),
            other => Err(format!(
                "invalid corner measure '{other}', expected harris|noble"
            )),
        }
    }
}

#[inline]
fn score_row(
    a: &[f32],
    b: &[f32],
    c: &[f32],
    out: &mut [f32],
    measure: CornerMeasure,
    k: f32,
    threshold: f32,
) {
    for (i, o) in out.iter_mut().enumerate() {
        let m = measure.evaluate(a[i], b[i], c[i], k);
        if m > threshold {
            *o = m;
        }
    }
}

/// Build the response map.
///
/// Only values strictly above `threshold` are written; every other cell keeps
/// its initial zero, which downstream stages read as "not a candidate".
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(tensor),
        fields(w = tensor.width(), h = tensor.height())
    )
)]
pub fn corner_response(
    tensor: &StructureTensor,
    measure: CornerMeasure,
    k: f32,
    threshold: f32,
) -> FloatMap {
    let (w, h) = (tensor.width(), tensor.height());
    let mut map = FloatMap::zeros(w, h);
    if w == 0 {
        return map;
    }

    #[cfg(feature = "rayon")]
    map.data
        .par_chunks_mut(w)
        .zip(tensor.xx.data.par_chunks(w))
        .zip(tensor.yy.data.par_chunks(w))
        .zip(tensor.xy.data.par_chunks(w))
        .for_each(|(((out, a), b), c)| score_row(a, b, c, out, measure, k, threshold));

    #[cfg(not(feature = "rayon"))]
    for (((out, a), b), c) in map
        .data
        .chunks_mut(w)
        .zip(tensor.xx.data.chunks(w))
        .zip(tensor.yy.data.chunks(w))
        .zip(tensor.xy.data.chunks(w))
    {
        score_row(a, b, c, out, measure, k, threshold);
    }

    map
}
