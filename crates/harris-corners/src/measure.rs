//! Distances between detected corners and a reference point.

use harris_corners_core::CornerPoint;

/// Euclidean distance from `origin` to each corner, in corner order.
pub fn distances_from(origin: CornerPoint, corners: &[CornerPoint]) -> Vec<f32> {
    corners.iter().map(|c| origin.distance_to(c)).collect()
}

/// Distance from `(0, 0)` to each corner.
pub fn distances_from_origin(corners: &[CornerPoint]) -> Vec<f32> {
    distances_from(CornerPoint::default(), corners)
}
