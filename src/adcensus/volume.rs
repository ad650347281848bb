//! # Cost volume
//!
//! A `width * height * range` buffer of matching costs, stored pixel-major so the costs of one
//! pixel over all candidate disparities are contiguous.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Cost of a disparity whose right image column lies outside the image.
pub const NO_MATCH_COST: f32 = 1.0;

/// Cost of a sample that is structurally unavailable while propagating or selecting.
pub const LARGE_COST: f32 = 99999.0;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct CostVolume {
    width: usize,
    height: usize,
    range: usize,
    data: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostVolume {
    /// Allocate a zeroed volume.
    pub fn new(width: usize, height: usize, range: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(range))
            .ok_or(Error::Allocation("cost volume"))?;

        Ok(Self {
            width,
            height,
            range,
            data: try_alloc(len, 0.0, "cost volume")?
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of candidate disparities per pixel.
    pub fn range(&self) -> usize {
        self.range
    }

    /// Index of disparity slot `d` (already offset by the minimum disparity) at `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, d: usize) -> usize {
        (y * self.width + x) * self.range + d
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, d: usize) -> f32 {
        self.data[self.index(x, y, d)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, d: usize, val: f32) {
        let idx = self.index(x, y, d);
        self.data[idx] = val;
    }

    /// All candidate costs of one pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.width + x) * self.range;
        &self.data[start..start + self.range]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let start = (y * self.width + x) * self.range;
        &mut self.data[start..start + self.range]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
