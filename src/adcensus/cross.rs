//! # Cross-based cost aggregation
//!
//! Every pixel gets an upright cross whose four arms grow while the colour along them stays
//! close to the anchor pixel. The support region of a pixel is the union of the horizontal arms
//! of all pixels on its vertical arm (or the other way round), and aggregation averages the cost
//! over that region.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::trace;

use super::color::{color_dist, ColorView};
use super::volume::CostVolume;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of aggregation iterations, alternating the order each time.
pub const AGGREGATION_ITERATIONS: usize = 4;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Arm lengths of one pixel, never reaching outside the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrossArm {
    pub left: u8,
    pub right: u8,
    pub top: u8,
    pub bottom: u8
}

/// Limits controlling how far arms may grow.
#[derive(Clone, Copy, Debug)]
pub struct ArmParams {
    /// Maximum arm length, at most 255.
    pub l1: i32,
    /// Length beyond which `t2` applies.
    pub l2: i32,
    pub t1: i32,
    pub t2: i32
}

pub struct CrossAggregator {
    width: usize,
    height: usize,
    arms: Vec<CrossArm>,
    /// Support region sizes, index 0 for horizontal first, 1 for vertical first.
    sup_count: [Vec<u32>; 2],
    sup_count_tmp: Vec<u32>,
    cost_tmp: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CrossAggregator {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let size = width * height;

        Ok(Self {
            width,
            height,
            arms: try_alloc(size, CrossArm::default(), "cross arms")?,
            sup_count: [
                try_alloc(size, 0, "support count")?,
                try_alloc(size, 0, "support count")?
            ],
            sup_count_tmp: try_alloc(size, 0, "support count scratch")?,
            cost_tmp: try_alloc(size, 0.0, "aggregation scratch")?
        })
    }

    pub fn arms(&self) -> &[CrossArm] {
        &self.arms
    }

    /// Build the cross of every pixel of `img`.
    pub fn build_arms(&mut self, img: &ColorView, params: &ArmParams) {
        for y in 0..self.height {
            for x in 0..self.width {
                let arm = &mut self.arms[y * self.width + x];
                arm.left = arm_length(img, x, y, -1, 0, params);
                arm.right = arm_length(img, x, y, 1, 0, params);
                arm.top = arm_length(img, x, y, 0, -1, params);
                arm.bottom = arm_length(img, x, y, 0, 1, params);
            }
        }
    }

    /// Aggregate `cost` in place over the support regions, `num_iters` times.
    ///
    /// The arms must have been built first.
    pub fn aggregate(&mut self, cost: &mut CostVolume, num_iters: usize) {
        if cost.width() != self.width || cost.height() != self.height {
            return;
        }

        self.compute_support_counts();

        let mut horizontal_first = true;
        for it in 0..num_iters {
            for d in 0..cost.range() {
                self.aggregate_slice(cost, d, horizontal_first);
            }
            trace!("aggregation iteration {} done (horizontal first: {})", it, horizontal_first);
            horizontal_first = !horizontal_first;
        }
    }

    /// Count the pixels in every support region, once per aggregation order.
    ///
    /// The two orders visit different pixels so each needs its own count.
    fn compute_support_counts(&mut self) {
        let width = self.width;

        for (id, &horizontal_first) in [true, false].iter().enumerate() {
            for y in 0..self.height {
                for x in 0..width {
                    let arm = self.arms[y * width + x];
                    self.sup_count_tmp[y * width + x] = if horizontal_first {
                        arm.left as u32 + arm.right as u32 + 1
                    }
                    else {
                        arm.top as u32 + arm.bottom as u32 + 1
                    };
                }
            }

            for y in 0..self.height {
                for x in 0..width {
                    let arm = self.arms[y * width + x];
                    let tmp = &self.sup_count_tmp;
                    self.sup_count[id][y * width + x] = if horizontal_first {
                        (y - arm.top as usize..=y + arm.bottom as usize)
                            .map(|yy| tmp[yy * width + x])
                            .sum()
                    }
                    else {
                        (x - arm.left as usize..=x + arm.right as usize)
                            .map(|xx| tmp[y * width + xx])
                            .sum()
                    };
                }
            }
        }
    }

    /// Aggregate the cost slice of one disparity, summing along one axis into the scratch
    /// buffer and then along the other back into the volume.
    fn aggregate_slice(&mut self, cost: &mut CostVolume, d: usize, horizontal_first: bool) {
        let width = self.width;

        for y in 0..self.height {
            for x in 0..width {
                let arm = self.arms[y * width + x];
                self.cost_tmp[y * width + x] = if horizontal_first {
                    (x - arm.left as usize..=x + arm.right as usize)
                        .map(|xx| cost.get(xx, y, d))
                        .sum()
                }
                else {
                    (y - arm.top as usize..=y + arm.bottom as usize)
                        .map(|yy| cost.get(x, yy, d))
                        .sum()
                };
            }
        }

        let counts = &self.sup_count[if horizontal_first { 0 } else { 1 }];
        for y in 0..self.height {
            for x in 0..width {
                let arm = self.arms[y * width + x];
                let tmp = &self.cost_tmp;
                let sum: f32 = if horizontal_first {
                    (y - arm.top as usize..=y + arm.bottom as usize)
                        .map(|yy| tmp[yy * width + x])
                        .sum()
                }
                else {
                    (x - arm.left as usize..=x + arm.right as usize)
                        .map(|xx| tmp[y * width + xx])
                        .sum()
                };

                cost.set(x, y, d, sum / counts[y * width + x] as f32);
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Walk from `(x, y)` in direction `(dx, dy)` and return how many steps the arm covers.
fn arm_length(img: &ColorView, x: usize, y: usize, dx: i32, dy: i32, params: &ArmParams) -> u8 {
    let anchor = img.at(x, y);
    let mut last = anchor;
    let mut len = 0u8;

    let mut xn = x as i32 + dx;
    let mut yn = y as i32 + dy;

    for n in 0..params.l1.min(255) {
        if xn < 0 || yn < 0 || xn >= img.width() as i32 || yn >= img.height() as i32 {
            break;
        }

        let color = img.at(xn as usize, yn as usize);

        let dist_anchor = color_dist(color, anchor);
        if dist_anchor >= params.t1 {
            break;
        }

        if n > 0 && color_dist(color, last) >= params.t1 {
            break;
        }

        // Long arms must stay within the tighter threshold
        if n + 1 > params.l2 && dist_anchor >= params.t2 {
            break;
        }

        len += 1;
        last = color;
        xn += dx;
        yn += dy;
    }

    len
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
