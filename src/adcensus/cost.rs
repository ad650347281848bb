//! # Initial matching cost
//!
//! Fuses a colour absolute difference term with a 9x7 census transform term into the initial
//! cost volume.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::trace;

use super::color::ColorView;
use super::volume::{CostVolume, NO_MATCH_COST};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Rows above and below the centre covered by the census window.
pub const CENSUS_HALF_HEIGHT: usize = 4;

/// Columns left and right of the centre covered by the census window.
pub const CENSUS_HALF_WIDTH: usize = 3;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct CostComputer {
    width: usize,
    height: usize,
    min_disparity: i32,
    max_disparity: i32,
    gray_left: Vec<u8>,
    gray_right: Vec<u8>,
    census_left: Vec<u64>,
    census_right: Vec<u64>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostComputer {
    pub fn new(width: usize, height: usize, min_disparity: i32, max_disparity: i32) -> Result<Self> {
        let size = width * height;

        Ok(Self {
            width,
            height,
            min_disparity,
            max_disparity,
            gray_left: try_alloc(size, 0, "left grayscale")?,
            gray_right: try_alloc(size, 0, "right grayscale")?,
            census_left: try_alloc(size, 0, "left census")?,
            census_right: try_alloc(size, 0, "right census")?
        })
    }

    /// Fill `cost` with the AD-Census cost of every pixel and candidate disparity.
    pub fn compute(
        &mut self,
        left: &ColorView,
        right: &ColorView,
        lambda_ad: i32,
        lambda_census: i32,
        cost: &mut CostVolume
    ) {
        to_gray(left, &mut self.gray_left);
        to_gray(right, &mut self.gray_right);

        census_transform_9x7(&self.gray_left, &mut self.census_left, self.width, self.height);
        census_transform_9x7(&self.gray_right, &mut self.census_right, self.width, self.height);
        trace!("census transform done");

        let lambda_ad = lambda_ad as f32;
        let lambda_census = lambda_census as f32;
        let width = self.width as i32;

        for y in 0..self.height {
            for x in 0..self.width {
                let color_l = left.at(x, y);
                let census_l = self.census_left[y * self.width + x];
                let costs = cost.pixel_mut(x, y);

                for (slot, d) in (self.min_disparity..self.max_disparity).enumerate() {
                    let xr = x as i32 - d;
                    if xr < 0 || xr >= width {
                        costs[slot] = NO_MATCH_COST;
                        continue;
                    }
                    let xr = xr as usize;

                    let color_r = right.at(xr, y);
                    let ad = color_l
                        .iter()
                        .zip(color_r.iter())
                        .map(|(&l, &r)| (l as i32 - r as i32).abs())
                        .sum::<i32>() as f32 / 3.0;

                    let ham = hamming(census_l, self.census_right[y * self.width + xr]) as f32;

                    costs[slot] = ad_census_cost(ad, ham, lambda_ad, lambda_census);
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// `gray = 0.299 R + 0.587 G + 0.114 B`, truncated.
pub fn to_gray(color: &ColorView, gray: &mut [u8]) {
    for y in 0..color.height() {
        for x in 0..color.width() {
            let [r, g, b] = color.at(x, y);
            gray[y * color.width() + x] =
                (r as f64 * 0.299 + g as f64 * 0.587 + b as f64 * 0.114) as u8;
        }
    }
}

/// Census transform over a 9 row by 7 column window.
///
/// Each window position, the centre included, contributes one bit which is set when the
/// neighbour is darker than the centre. Pixels whose window leaves the image are left untouched.
pub fn census_transform_9x7(gray: &[u8], census: &mut [u64], width: usize, height: usize) {
    if width < 2 * CENSUS_HALF_WIDTH + 1 || height < 2 * CENSUS_HALF_HEIGHT + 1 {
        return;
    }

    for y in CENSUS_HALF_HEIGHT..height - CENSUS_HALF_HEIGHT {
        for x in CENSUS_HALF_WIDTH..width - CENSUS_HALF_WIDTH {
            let center = gray[y * width + x];

            let mut val = 0u64;
            for yy in y - CENSUS_HALF_HEIGHT..=y + CENSUS_HALF_HEIGHT {
                for xx in x - CENSUS_HALF_WIDTH..=x + CENSUS_HALF_WIDTH {
                    val <<= 1;
                    if gray[yy * width + xx] < center {
                        val |= 1;
                    }
                }
            }

            census[y * width + x] = val;
        }
    }
}

/// Number of differing bits between two census descriptors.
#[inline]
pub fn hamming(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Fuse the two cost terms, each mapped into `[0, 1)` by exponential decay.
#[inline]
pub fn ad_census_cost(ad: f32, ham: f32, lambda_ad: f32, lambda_census: f32) -> f32 {
    (1.0 - (-ad / lambda_ad).exp()) + (1.0 - (-ham / lambda_census).exp())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
