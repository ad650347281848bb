//! # Disparity selection
//!
//! Winner-take-all over the optimised cost, refined to sub-pixel precision by fitting a parabola
//! through the minimum and its two neighbours.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use super::volume::{CostVolume, LARGE_COST};
use crate::disparity::INVALID_DISPARITY;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Select the disparity of every left image pixel into `disp`.
pub fn select_left(cost: &CostVolume, min_disparity: i32, disp: &mut [f32]) {
    for y in 0..cost.height() {
        for x in 0..cost.width() {
            disp[y * cost.width() + x] = subpixel_disparity(cost.pixel(x, y), min_disparity);
        }
    }
}

/// Select the disparity of every right image pixel into `disp`.
///
/// The right cost of `(x, y)` at disparity `d` is the left cost of `(x + d, y)` at `d`. Columns
/// falling outside the image take `LARGE_COST` so they never win.
pub fn select_right(cost: &CostVolume, min_disparity: i32, disp: &mut [f32]) {
    let width = cost.width() as i32;
    let mut costs = vec![LARGE_COST; cost.range()];

    for y in 0..cost.height() {
        for x in 0..cost.width() {
            for (slot, c) in costs.iter_mut().enumerate() {
                let xl = x as i32 + slot as i32 + min_disparity;
                *c = if xl >= 0 && xl < width {
                    cost.get(xl as usize, y, slot)
                }
                else {
                    LARGE_COST
                };
            }

            disp[y * cost.width() + x] = subpixel_disparity(&costs, min_disparity);
        }
    }
}

/// Best disparity of one pixel from its candidate costs.
///
/// A minimum on the first or last candidate cannot be fitted and gives an invalid disparity.
pub fn subpixel_disparity(costs: &[f32], min_disparity: i32) -> f32 {
    let mut best = 0;
    let mut min_cost = LARGE_COST;
    for (slot, &c) in costs.iter().enumerate() {
        if c < min_cost {
            min_cost = c;
            best = slot;
        }
    }

    if best == 0 || best + 1 >= costs.len() {
        return INVALID_DISPARITY;
    }

    let c1 = costs[best - 1];
    let c2 = costs[best + 1];
    let denom = c1 + c2 - 2.0 * min_cost;

    let disp = (best as i32 + min_disparity) as f32;
    if denom != 0.0 {
        disp + (c1 - c2) / (denom * 2.0)
    }
    else {
        disp
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
