//! 3x3 difference gradients and their products.
//!
//! For each interior pixel the eight neighbours give
//!
//! ```text
//! h = ((tl + t + tr) - (bl + b + br)) / 6
//! v = ((tl + l + bl) - (tr + r + br)) / 6
//! ```
//!
//! and the products `h²`, `v²`, `h·v` are stored. The one-pixel image border
//! stays zero. The kernel is fixed (Prewitt-like) and not configurable.

use crate::gray::GrayBuffer;
use crate::map::StructureTensor;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

const SIXTH: f32 = 1.0 / 6.0;

#[inline]
fn gradient_row(gray: &GrayBuffer<'_>, y: usize, xx: &mut [f32], yy: &mut [f32], xy: &mut [f32]) {
    let w = gray.width;
    let top = gray.row(y - 1);
    let mid = gray.row(y);
    let bot = gray.row(y + 1);

    for x in 1..w - 1 {
        let (tl, t, tr) = (top[x - 1] as i32, top[x] as i32, top[x + 1] as i32);
        let (l, r) = (mid[x - 1] as i32, mid[x + 1] as i32);
        let (bl, b, br) = (bot[x - 1] as i32, bot[x] as i32, bot[x + 1] as i32);

        let h = ((tl + t + tr) - (bl + b + br)) as f32 * SIXTH;
        let v = ((tl + l + bl) - (tr + r + br)) as f32 * SIXTH;

        xx[x] = h * h;
        yy[x] = v * v;
        xy[x] = h * v;
    }
}

/// Compute the unsmoothed gradient products for a grayscale buffer.
///
/// Images smaller than 3x3 have no interior and yield all-zero maps.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(gray), fields(w = gray.width, h = gray.height))
)]
pub fn gradient_products(gray: &GrayBuffer<'_>) -> StructureTensor {
    let (w, h) = (gray.width, gray.height);
    let mut tensor = StructureTensor::zeros(w, h);
    if w < 3 || h < 3 {
        return tensor;
    }

    let StructureTensor { xx, yy, xy } = &mut tensor;

    #[cfg(feature = "rayon")]
    xx.data
        .par_chunks_mut(w)
        .zip(yy.data.par_chunks_mut(w))
        .zip(xy.data.par_chunks_mut(w))
        .enumerate()
        .filter(|(y, _)| *y >= 1 && *y < h - 1)
        .for_each(|(y, ((rxx, ryy), rxy))| gradient_row(gray, y, rxx, ryy, rxy));

    #[cfg(not(feature = "rayon"))]
    for (y, ((rxx, ryy), rxy)) in xx
        .data
        .chunks_mut(w)
        .zip(yy.data.chunks_mut(w))
        .zip(xy.data.chunks_mut(w))
        .enumerate()
        .take(h - 1)
        .skip(1)
    {
        gradient_row(gray, y, rxx, ryy, rxy);
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn gray(w: usize, h: usize, f: impl Fn(usize, usize) -> u8) -> GrayBuffer<'static> {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        GrayBuffer {
            width: w,
            height: h,
            stride: w,
            data: Cow::Owned(data),
        }
    }

    #[test]
    fn flat_image_has_no_gradient() {
        let g = gray(8, 6, |_, _| 77);
        let t = gradient_products(&g);
        assert_eq!(t.xx.count_nonzero(), 0);
        assert_eq!(t.yy.count_nonzero(), 0);
        assert_eq!(t.xy.count_nonzero(), 0);
    }

    #[test]
    fn horizontal_edge_only_feeds_h() {
        // Bright top half, dark bottom half: rows differ, columns do not.
        let g = gray(7, 8, |_, y| if y < 4 { 240 } else { 0 });
        let t = gradient_products(&g);

        // Row 3 sees one bright row above-and-centre and one dark row below.
        let h = (3.0 * 240.0) / 6.0;
        assert!((t.xx.at(3, 3) - h * h).abs() < 1e-3);
        assert_eq!(t.yy.at(3, 3), 0.0);
        assert_eq!(t.xy.at(3, 3), 0.0);
        // Far from the edge nothing happens.
        assert_eq!(t.xx.at(3, 1), 0.0);
    }

    #[test]
    fn vertical_edge_only_feeds_v() {
        let g = gray(8, 7, |x, _| if x < 4 { 0 } else { 180 });
        let t = gradient_products(&g);
        let v = -(3.0 * 180.0) / 6.0;
        assert!((t.yy.at(4, 3) - v * v).abs() < 1e-3);
        assert_eq!(t.xx.at(4, 3), 0.0);
    }

    #[test]
    fn border_ring_stays_zero() {
        let g = gray(6, 6, |x, y| ((x * 37 + y * 91) % 256) as u8);
        let t = gradient_products(&g);
        for i in 0..6 {
            for m in [&t.xx, &t.yy, &t.xy] {
                assert_eq!(m.at(i, 0), 0.0);
                assert_eq!(m.at(i, 5), 0.0);
                assert_eq!(m.at(0, i), 0.0);
                assert_eq!(m.at(5, i), 0.0);
            }
        }
    }

    #[test]
    fn tiny_images_are_all_zero() {
        let g = gray(2, 9, |x, y| (x * 100 + y) as u8);
        let t = gradient_products(&g);
        assert_eq!((t.width(), t.height()), (2, 9));
        assert_eq!(t.xx.count_nonzero(), 0);
    }

    #[test]
    fn strided_gray_reads_logical_pixels_only() {
        // Padding bytes are 255 and must not leak into the gradient.
        let mut data = Vec::new();
        for _ in 0..5 {
            data.extend_from_slice(&[10, 10, 10, 10, 10, 255, 255]);
        }
        let g = GrayBuffer {
            width: 5,
            height: 5,
            stride: 7,
            data: Cow::Owned(data),
        };
        let t = gradient_products(&g);
        assert_eq!(t.xx.count_nonzero() + t.yy.count_nonzero(), 0);
    }
}
