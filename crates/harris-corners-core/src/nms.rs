//! Non-maximum suppression over a thresholded response map.

use crate::corner::CornerPoint;
use crate::map::FloatMap;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Width of the ring that is never reported, for a given window radius.
#[inline]
pub fn border_margin(radius: usize) -> usize {
    radius.max(1)
}

/// A non-zero cell survives unless some cell of the `(2r+1)²` window around
/// it holds a strictly larger value. Equal neighbours do not disqualify.
#[inline]
fn is_local_max(map: &FloatMap, x: usize, y: usize, r: usize, v: f32) -> bool {
    for yy in y - r..=y + r {
        let row = &map.row(yy)[x - r..=x + r];
        if row.iter().any(|&n| n > v) {
            return false;
        }
    }
    true
}

fn suppress_row(map: &FloatMap, y: usize, r: usize, margin: usize) -> Vec<CornerPoint> {
    let mut out = Vec::new();
    for x in margin..map.w - margin {
        let v = map.at(x, y);
        if v == 0.0 {
            continue;
        }
        if is_local_max(map, x, y, r, v) {
            out.push(CornerPoint::new(x as u32, y as u32));
        }
    }
    out
}

/// Keep the local maxima of `map` in raster order (top-to-bottom,
/// left-to-right).
///
/// Cells within `max(1, radius)` of any border are never candidates, so the
/// full window always lies inside the map.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(map), fields(w = map.w, h = map.h))
)]
pub fn suppress_non_maxima(map: &FloatMap, radius: usize) -> Vec<CornerPoint> {
    let margin = border_margin(radius);
    if map.w <= 2 * margin || map.h <= 2 * margin {
        return Vec::new();
    }

    #[cfg(feature = "rayon")]
    let corners: Vec<CornerPoint> = (margin..map.h - margin)
        .into_par_iter()
        .map(|y| suppress_row(map, y, radius, margin))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    #[cfg(not(feature = "rayon"))]
    let corners: Vec<CornerPoint> = (margin..map.h - margin)
        .flat_map(|y| suppress_row(map, y, radius, margin))
        .collect();

    corners
}
