//! # Scanline optimisation
//!
//! Four one dimensional dynamic programming passes (left to right, right to left, top to bottom,
//! bottom to top) smooth the aggregated cost. Each pass reads the output of the previous one and
//! writes into the other buffer of a ping-pong pair, so the result of the last pass lands back
//! in the buffer that was passed in.
//!
//! The recurrence for pixel `p` along direction `r` is
//!
//! ```text
//! L(p, d) = (C(p, d) + min(L(p-r, d), L(p-r, d-1) + P1, L(p-r, d+1) + P1, min L(p-r) + P2)) / 2
//! ```
//!
//! where the penalties shrink when the colour changes sharply along the path in either image.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::trace;

use super::color::{color_dist, ColorView};
use super::volume::{CostVolume, LARGE_COST};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct ScanlineOptimizer {
    pub min_disparity: i32,
    pub p1: f32,
    pub p2: f32,
    pub tso: i32
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Direction {
    /// All passes in the order they are run.
    pub const ORDER: [Direction; 4] = [
        Direction::LeftToRight,
        Direction::RightToLeft,
        Direction::TopToBottom,
        Direction::BottomToTop
    ];

    /// Step between consecutive pixels of a path.
    fn step(self) -> (i32, i32) {
        match self {
            Direction::LeftToRight => (1, 0),
            Direction::RightToLeft => (-1, 0),
            Direction::TopToBottom => (0, 1),
            Direction::BottomToTop => (0, -1)
        }
    }
}

impl ScanlineOptimizer {
    /// Run all four passes. `cost` holds the aggregated cost on entry and the optimised cost on
    /// exit, `twin` is scratch of the same shape.
    pub fn optimize(
        &self,
        left: &ColorView,
        right: &ColorView,
        cost: &mut CostVolume,
        twin: &mut CostVolume
    ) {
        if cost.width() != twin.width()
            || cost.height() != twin.height()
            || cost.range() != twin.range()
        {
            return;
        }

        for (i, &dir) in Direction::ORDER.iter().enumerate() {
            if i % 2 == 0 {
                self.pass(left, right, cost, twin, dir);
            }
            else {
                self.pass(left, right, twin, cost, dir);
            }
        }
    }

    /// Penalties for a path step, given the colour change in the left and right image.
    #[inline]
    pub fn penalties(&self, d1: i32, d2: i32) -> (f32, f32) {
        match (d1 < self.tso, d2 < self.tso) {
            (true, true) => (self.p1, self.p2),
            (false, false) => (self.p1 / 10.0, self.p2 / 10.0),
            _ => (self.p1 / 4.0, self.p2 / 4.0)
        }
    }

    /// One directional pass from `src` into `dst`.
    pub fn pass(
        &self,
        left: &ColorView,
        right: &ColorView,
        src: &CostVolume,
        dst: &mut CostVolume,
        dir: Direction
    ) {
        let width = src.width() as i32;
        let height = src.height() as i32;
        let range = src.range();
        let (dx, dy) = dir.step();

        // Costs of the previous pixel on the path, padded on both sides so d-1 and d+1 exist
        let mut last = vec![LARGE_COST; range + 2];

        let (num_paths, path_len) = if dy == 0 { (height, width) } else { (width, height) };

        for path in 0..num_paths {
            // First pixel of the path
            let (mut x, mut y) = match dir {
                Direction::LeftToRight => (0, path),
                Direction::RightToLeft => (width - 1, path),
                Direction::TopToBottom => (path, 0),
                Direction::BottomToTop => (path, height - 1)
            };

            dst.pixel_mut(x as usize, y as usize)
                .copy_from_slice(src.pixel(x as usize, y as usize));
            last[1..=range].copy_from_slice(dst.pixel(x as usize, y as usize));
            let mut min_last = min_of(&last);

            let mut color_last = left.at(x as usize, y as usize);

            for _ in 1..path_len {
                x += dx;
                y += dy;

                let color = left.at(x as usize, y as usize);
                let d1 = color_dist(color, color_last);

                let costs = src.pixel(x as usize, y as usize);
                let out = dst.pixel_mut(x as usize, y as usize);
                let mut min_cost = LARGE_COST;

                for d in 0..range {
                    let xr = x - d as i32 - self.min_disparity;
                    let d2 = if xr > 0 && xr < width - 1 {
                        color_dist(
                            right.at(xr as usize, y as usize),
                            right.at((xr - dx) as usize, (y - dy) as usize)
                        )
                    }
                    else {
                        d1
                    };

                    let (p1, p2) = self.penalties(d1, d2);

                    let l1 = last[d + 1];
                    let l2 = last[d] + p1;
                    let l3 = last[d + 2] + p1;
                    let l4 = min_last + p2;

                    let smoothed = (costs[d] + l1.min(l2).min(l3).min(l4)) / 2.0;

                    out[d] = smoothed;
                    min_cost = min_cost.min(smoothed);
                }

                last[1..=range].copy_from_slice(out);
                min_last = min_cost;
                color_last = color;
            }
        }

        trace!("scanline pass {:?} done", dir);
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn min_of(vals: &[f32]) -> f32 {
    vals.iter().fold(LARGE_COST, |acc, &v| acc.min(v))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
