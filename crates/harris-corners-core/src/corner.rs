use serde::{Deserialize, Serialize};

/// Integer pixel position of a detected corner, in source-image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CornerPoint {
    pub x: u32,
    pub y: u32,
}

impl CornerPoint {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    #[inline]
    pub fn distance_to(&self, other: &CornerPoint) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(u32, u32)> for CornerPoint {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}
