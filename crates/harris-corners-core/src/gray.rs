//! Reduction of supported encodings to 8-bit luminance.

use std::borrow::Cow;

use crate::image::{ImageView, SourcePixels};

#[cfg(feature = "tracing")]
use tracing::instrument;

// ITU-R BT.709 luma weights.
const LUMA_R: f32 = 0.2125;
const LUMA_G: f32 = 0.7154;
const LUMA_B: f32 = 0.0721;

/// Single-channel intensity buffer.
///
/// Single-channel sources are borrowed as-is (keeping the caller's stride);
/// color sources are reduced into an owned, tightly packed buffer.
#[derive(Clone, Debug)]
pub struct GrayBuffer<'a> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub data: Cow<'a, [u8]>,
}

impl GrayBuffer<'_> {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// True when the buffer aliases the caller's memory.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }
}

#[inline]
fn luma_bt709(r: u8, g: u8, b: u8) -> u8 {
    (LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32) as u8
}

fn reduce_color(view: &ImageView<'_>, r: usize, g: usize, b: usize) -> GrayBuffer<'static> {
    let bpp = view.format().bytes_per_pixel();
    let (w, h) = (view.width(), view.height());
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        for px in view.row(y).chunks_exact(bpp) {
            data.push(luma_bt709(px[r], px[g], px[b]));
        }
    }
    GrayBuffer {
        width: w,
        height: h,
        stride: w,
        data: Cow::Owned(data),
    }
}

/// Produce the luminance buffer the gradient stage reads.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(src)))]
pub(crate) fn reduce_to_gray<'a>(src: SourcePixels<'a>) -> GrayBuffer<'a> {
    match src {
        SourcePixels::Indexed8(view) => GrayBuffer {
            width: view.width(),
            height: view.height(),
            stride: view.stride(),
            data: Cow::Borrowed(view.data()),
        },
        SourcePixels::Rgb24(view) => reduce_color(&view, 0, 1, 2),
        SourcePixels::Rgb32(view) => reduce_color(&view, 0, 1, 2),
        SourcePixels::Argb32(view) => reduce_color(&view, 1, 2, 3),
    }
}
