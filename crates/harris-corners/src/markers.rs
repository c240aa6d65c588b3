//! Square corner markers drawn onto RGB images.

use harris_corners_core::CornerPoint;
use image::{DynamicImage, Rgb, RgbImage};

pub const DEFAULT_MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const DEFAULT_MARKER_WIDTH: u32 = 4;

/// Fill a `width × width` square on each corner, clipped to the image.
///
/// For even widths the square extends one pixel further up and left than
/// down and right: width 4 covers `x-2..=x+1`.
pub fn draw_corner_markers(
    img: &mut RgbImage,
    corners: &[CornerPoint],
    color: Rgb<u8>,
    width: u32,
) {
    if width == 0 {
        return;
    }
    let (w, h) = img.dimensions();
    let before = width / 2;
    let after = width - before;
    for c in corners {
        let x0 = c.x.saturating_sub(before);
        let y0 = c.y.saturating_sub(before);
        let x1 = c.x.saturating_add(after).min(w);
        let y1 = c.y.saturating_add(after).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Convert `img` to RGB8 and mark every corner on the copy.
pub fn marked_image(
    img: &DynamicImage,
    corners: &[CornerPoint],
    color: Rgb<u8>,
    width: u32,
) -> RgbImage {
    let mut out = img.to_rgb8();
    draw_corner_markers(&mut out, corners, color, width);
    out
}
