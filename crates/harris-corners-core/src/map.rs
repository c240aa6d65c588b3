use serde::{Deserialize, Serialize};

/// Dense `f32` map in row-major layout.
///
/// Derivative products, their smoothed versions and the corner response all
/// use this type, always sized like the source image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatMap {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl FloatMap {
    /// Zero-filled map.
    pub fn zeros(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    #[inline]
    /// Value at an integer coordinate.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.w + x] = v;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.w..(y + 1) * self.w]
    }

    #[inline]
    pub fn same_size(&self, other: &FloatMap) -> bool {
        self.w == other.w && self.h == other.h
    }

    /// Number of non-zero cells.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }
}

/// The three per-pixel gradient products (`h²`, `v²`, `h·v`).
///
/// After smoothing these are the entries `A`, `B`, `C` of the structure
/// tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureTensor {
    pub xx: FloatMap,
    pub yy: FloatMap,
    pub xy: FloatMap,
}

impl StructureTensor {
    pub fn zeros(w: usize, h: usize) -> Self {
        Self {
            xx: FloatMap::zeros(w, h),
            yy: FloatMap::zeros(w, h),
            xy: FloatMap::zeros(w, h),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.xx.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.xx.h
    }
}
