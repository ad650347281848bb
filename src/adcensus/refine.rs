//! # Multi-step disparity refinement
//!
//! Cleans up the raw left disparity map in order:
//!
//! 1. Outlier detection: left-right consistency check, sorting failures into occlusions and
//!    mismatches.
//! 2. Iterative region voting: fill from the disparity histogram of the support region.
//! 3. Proper interpolation: fill from the first valid disparities found along rays.
//! 4. Discontinuity adjustment: snap edge pixels to a cheaper neighbouring disparity.
//!
//! and finally runs a 3x3 median filter.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::cmp::Ordering;
use std::f32::consts::PI;

use log::debug;

use super::color::{color_dist, ColorView};
use super::cross::CrossArm;
use super::params::{InterpolationRays, Params};
use super::volume::CostVolume;
use crate::disparity::INVALID_DISPARITY;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of region voting iterations.
pub const VOTING_ITERATIONS: usize = 5;

/// Sobel magnitude above which a disparity pixel is a discontinuity.
pub const EDGE_THRESHOLD: f32 = 5.0;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Pixel coordinates `(x, y)`.
pub type Pixel = (usize, usize);

pub struct MultiStepRefiner {
    width: usize,
    height: usize,
    params: Params,
    occlusions: Vec<Pixel>,
    mismatches: Vec<Pixel>,
    histogram: Vec<u32>,
    scratch: Vec<f32>
}

/// Buffers the refiner reads.
pub struct RefineInput<'a, 'b> {
    /// Final cost volume the disparities were selected from.
    pub cost: &'a CostVolume,
    /// Cross arms of the left image.
    pub arms: &'a [CrossArm],
    /// Left colour image.
    pub left: &'a ColorView<'b>,
    /// Raw right disparity map.
    pub disp_right: &'a [f32]
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PixelClass {
    Mismatch,
    Occlusion
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl MultiStepRefiner {
    pub fn new(width: usize, height: usize, params: &Params) -> Result<Self> {
        Ok(Self {
            width,
            height,
            params: params.clone(),
            occlusions: Vec::new(),
            mismatches: Vec::new(),
            histogram: try_alloc(params.disparity_range().max(0) as usize, 0, "voting histogram")?,
            scratch: try_alloc(width * height, 0.0, "refinement scratch")?
        })
    }

    /// Pixels classified as occluded and still unresolved.
    pub fn occlusions(&self) -> &[Pixel] {
        &self.occlusions
    }

    /// Pixels classified as mismatched and still unresolved.
    pub fn mismatches(&self) -> &[Pixel] {
        &self.mismatches
    }

    /// Run every enabled step on `disp_left`, then the median filter.
    pub fn refine(&mut self, input: &RefineInput, disp_left: &mut [f32]) {
        let size = self.width * self.height;
        if disp_left.len() != size
            || input.disp_right.len() != size
            || input.arms.len() != size
            || input.cost.width() != self.width
            || input.cost.height() != self.height
        {
            return;
        }

        self.outlier_detection(disp_left, input.disp_right);
        debug!(
            "outlier detection: {} mismatches, {} occlusions",
            self.mismatches.len(),
            self.occlusions.len()
        );

        if self.params.do_region_voting {
            self.iterative_region_voting(disp_left, input.arms);
            debug!(
                "region voting: {} mismatches, {} occlusions left",
                self.mismatches.len(),
                self.occlusions.len()
            );
        }

        if self.params.do_interpolation {
            self.proper_interpolation(disp_left, input.left);
            debug!(
                "interpolation: {} mismatches, {} occlusions left",
                self.mismatches.len(),
                self.occlusions.len()
            );
        }

        if self.params.do_discontinuity_adjustment {
            self.discontinuity_adjustment(disp_left, input.cost);
        }

        self.median_filter(disp_left);
    }

    /// Sort inconsistent pixels into occlusions and mismatches, invalidating them.
    ///
    /// With the consistency check disabled only pixels that are already invalid are collected,
    /// as mismatches.
    pub fn outlier_detection(&mut self, disp_left: &mut [f32], disp_right: &[f32]) {
        let width = self.width as i64;
        let threshold = self.params.lrcheck_thres;

        self.occlusions.clear();
        self.mismatches.clear();

        for y in 0..self.height {
            let row = y * self.width;
            for x in 0..self.width {
                let disp = disp_left[row + x];
                if disp == INVALID_DISPARITY {
                    self.mismatches.push((x, y));
                    continue;
                }

                if !self.params.do_lr_check {
                    continue;
                }

                let col_right = (x as f32 - disp).round() as i64;
                if col_right < 0 || col_right >= width {
                    disp_left[row + x] = INVALID_DISPARITY;
                    self.mismatches.push((x, y));
                    continue;
                }

                let disp_r = disp_right[row + col_right as usize];
                if (disp - disp_r).abs() <= threshold {
                    continue;
                }

                // A pixel is occluded when the pixel its match maps back to sits in front of it
                let col_rl = (col_right as f32 + disp_r).round() as i64;
                if col_rl >= 0 && col_rl < width && disp_left[row + col_rl as usize] > disp {
                    self.occlusions.push((x, y));
                }
                else {
                    self.mismatches.push((x, y));
                }

                disp_left[row + x] = INVALID_DISPARITY;
            }
        }
    }

    /// Run every voting iteration.
    pub fn iterative_region_voting(&mut self, disp: &mut [f32], arms: &[CrossArm]) {
        for _ in 0..VOTING_ITERATIONS {
            self.vote_once(disp, arms);
        }
    }

    /// One voting iteration over mismatches then occlusions. Filled pixels leave their set.
    pub fn vote_once(&mut self, disp: &mut [f32], arms: &[CrossArm]) {
        for class in [PixelClass::Mismatch, PixelClass::Occlusion].iter() {
            let mut pixels = match class {
                PixelClass::Mismatch => std::mem::take(&mut self.mismatches),
                PixelClass::Occlusion => std::mem::take(&mut self.occlusions)
            };

            for &(x, y) in pixels.iter() {
                if disp[y * self.width + x] != INVALID_DISPARITY {
                    continue;
                }
                if let Some(d) = self.vote(disp, arms, x, y) {
                    disp[y * self.width + x] = d;
                }
            }

            pixels.retain(|&(x, y)| disp[y * self.width + x] == INVALID_DISPARITY);

            match class {
                PixelClass::Mismatch => self.mismatches = pixels,
                PixelClass::Occlusion => self.occlusions = pixels
            }
        }
    }

    /// Most common valid disparity in the support region of `(x, y)`, if it wins clearly.
    fn vote(&mut self, disp: &[f32], arms: &[CrossArm], x: usize, y: usize) -> Option<f32> {
        let width = self.width;
        let min_disparity = self.params.min_disparity;
        let range = self.histogram.len() as i32;

        for h in self.histogram.iter_mut() {
            *h = 0;
        }

        let arm = arms[y * width + x];
        for yy in y - arm.top as usize..=y + arm.bottom as usize {
            let row_arm = arms[yy * width + x];
            for xx in x - row_arm.left as usize..=x + row_arm.right as usize {
                let d = disp[yy * width + xx];
                if d == INVALID_DISPARITY {
                    continue;
                }
                let bin = d.round() as i32 - min_disparity;
                if bin >= 0 && bin < range {
                    self.histogram[bin as usize] += 1;
                }
            }
        }

        let mut best = 0;
        let mut best_votes = 0;
        let mut total = 0;
        for (bin, &votes) in self.histogram.iter().enumerate() {
            if votes > best_votes {
                best_votes = votes;
                best = bin;
            }
            total += votes;
        }

        if best_votes > 0
            && total as i64 > self.params.irv_ts as i64
            && best_votes as f32 / total as f32 > self.params.irv_th
        {
            Some((best as i32 + min_disparity) as f32)
        }
        else {
            None
        }
    }

    /// Fill unresolved pixels from the first valid disparities met along rays around them.
    ///
    /// Rays reach up to twice the largest disparity magnitude.
    ///
    /// Mismatches take the candidate closest in colour (16 rays) or the median candidate
    /// (8 rays). Occlusions take the smallest candidate since they belong to the background.
    pub fn proper_interpolation(&mut self, disp: &mut [f32], left: &ColorView) {
        let angles: Vec<f32> = match self.params.interpolation {
            InterpolationRays::Sixteen => (0..16).map(|k| k as f32 * PI / 16.0).collect(),
            InterpolationRays::Eight => (0..8).map(|k| k as f32 * PI / 4.0).collect()
        };
        let rays: Vec<(f32, f32)> = angles.iter().map(|a| (a.cos(), a.sin())).collect();

        let max_search = 2 * self.params.min_disparity.unsigned_abs()
            .max(self.params.max_disparity.unsigned_abs()) as usize;

        for class in [PixelClass::Mismatch, PixelClass::Occlusion].iter() {
            let mut pixels = match class {
                PixelClass::Mismatch => std::mem::take(&mut self.mismatches),
                PixelClass::Occlusion => std::mem::take(&mut self.occlusions)
            };

            let current: &[f32] = disp;
            let mut candidates = Vec::with_capacity(rays.len());
            let fills: Vec<f32> = pixels
                .iter()
                .map(|&(x, y)| {
                    self.collect_candidates(current, &rays, max_search, x, y, &mut candidates);
                    self.choose_fill(*class, left, x, y, &mut candidates)
                })
                .collect();

            for (&(x, y), &fill) in pixels.iter().zip(fills.iter()) {
                if fill != INVALID_DISPARITY {
                    disp[y * self.width + x] = fill;
                }
            }

            pixels.retain(|&(x, y)| disp[y * self.width + x] == INVALID_DISPARITY);

            match class {
                PixelClass::Mismatch => self.mismatches = pixels,
                PixelClass::Occlusion => self.occlusions = pixels
            }
        }
    }

    /// First valid disparity along each ray, as `(x, y, disparity)`.
    fn collect_candidates(
        &self,
        disp: &[f32],
        rays: &[(f32, f32)],
        max_search: usize,
        x: usize,
        y: usize,
        out: &mut Vec<(usize, usize, f32)>
    ) {
        out.clear();

        for &(cos, sin) in rays {
            for m in 1..max_search {
                let xx = (x as f32 + m as f32 * cos).round() as i64;
                let yy = (y as f32 + m as f32 * sin).round() as i64;
                if xx < 0 || yy < 0 || xx >= self.width as i64 || yy >= self.height as i64 {
                    break;
                }

                let d = disp[yy as usize * self.width + xx as usize];
                if d != INVALID_DISPARITY {
                    out.push((xx as usize, yy as usize, d));
                    break;
                }
            }
        }
    }

    fn choose_fill(
        &self,
        class: PixelClass,
        left: &ColorView,
        x: usize,
        y: usize,
        candidates: &mut Vec<(usize, usize, f32)>
    ) -> f32 {
        if candidates.is_empty() {
            return INVALID_DISPARITY;
        }

        match (class, self.params.interpolation) {
            (PixelClass::Occlusion, _) => candidates
                .iter()
                .fold(INVALID_DISPARITY, |acc, c| acc.min(c.2)),
            (PixelClass::Mismatch, InterpolationRays::Sixteen) => {
                let color = left.at(x, y);
                let mut best = candidates[0];
                let mut best_dist = i32::MAX;
                for &c in candidates.iter() {
                    let dist = color_dist(left.at(c.0, c.1), color);
                    if dist < best_dist {
                        best_dist = dist;
                        best = c;
                    }
                }
                best.2
            }
            (PixelClass::Mismatch, InterpolationRays::Eight) => {
                candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));
                candidates[candidates.len() / 2].2
            }
        }
    }

    /// Snap disparities on depth edges to a horizontal neighbour's disparity if that is cheaper.
    pub fn discontinuity_adjustment(&mut self, disp: &mut [f32], cost: &CostVolume) {
        let (width, height) = (self.width, self.height);
        if width < 3 || height < 3 {
            return;
        }

        self.scratch.copy_from_slice(disp);
        let snapshot = &self.scratch;
        let min_disparity = self.params.min_disparity;
        let range = cost.range() as i32;

        let slot = |d: f32| -> Option<usize> {
            let s = d.round() as i32 - min_disparity;
            if s >= 0 && s < range {
                Some(s as usize)
            }
            else {
                None
            }
        };

        let mut adjusted = 0usize;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                if !is_edge(snapshot, width, x, y) {
                    continue;
                }

                let d = snapshot[y * width + x];
                let mut best_cost = match slot(d) {
                    Some(s) => cost.get(x, y, s),
                    None => continue
                };
                let mut best = d;

                for &xn in [x - 1, x + 1].iter() {
                    let dn = snapshot[y * width + xn];
                    if dn == INVALID_DISPARITY {
                        continue;
                    }
                    if let Some(s) = slot(dn) {
                        let c = cost.get(x, y, s);
                        if c < best_cost {
                            best_cost = c;
                            best = dn;
                        }
                    }
                }

                if best != d {
                    adjusted += 1;
                }
                disp[y * width + x] = best;
            }
        }

        debug!("discontinuity adjustment changed {} pixels", adjusted);
    }

    /// 3x3 median over the in-image neighbourhood of each pixel. Invalid values sort last.
    pub fn median_filter(&mut self, disp: &mut [f32]) {
        let (width, height) = (self.width, self.height);
        self.scratch.copy_from_slice(disp);

        let mut window = [0f32; 9];
        for y in 0..height {
            for x in 0..width {
                let mut n = 0;
                for yy in y.saturating_sub(1)..(y + 2).min(height) {
                    for xx in x.saturating_sub(1)..(x + 2).min(width) {
                        window[n] = self.scratch[yy * width + xx];
                        n += 1;
                    }
                }

                let vals = &mut window[..n];
                vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                disp[y * width + x] = vals[n / 2];
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Sobel edge test at an interior pixel. Windows touching an invalid disparity are not edges.
fn is_edge(disp: &[f32], width: usize, x: usize, y: usize) -> bool {
    let at = |dx: isize, dy: isize| {
        disp[(y as isize + dy) as usize * width + (x as isize + dx) as usize]
    };

    let mut p = [0f32; 9];
    for (i, v) in p.iter_mut().enumerate() {
        *v = at(i as isize % 3 - 1, i as isize / 3 - 1);
        if !v.is_finite() {
            return false;
        }
    }

    let gx = (p[2] + 2.0 * p[5] + p[8]) - (p[0] + 2.0 * p[3] + p[6]);
    let gy = (p[6] + 2.0 * p[7] + p[8]) - (p[0] + 2.0 * p[1] + p[2]);

    gx.abs() + gy.abs() > EDGE_THRESHOLD
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adcensus::cross::{ArmParams, CrossAggregator};

    const ARM_PARAMS: ArmParams = ArmParams {
        l1: 34,
        l2: 17,
        t1: 20,
        t2: 6
    };

    fn params() -> Params {
        Params {
            irv_ts: 1,
            irv_th: 0.0,
            ..Params::with_disparity(0, 16)
        }
    }

    fn flat_arms(w: usize, h: usize, data: &[u8]) -> Vec<CrossArm> {
        let img = ColorView::new(w, h, data).unwrap();
        let mut agg = CrossAggregator::new(w, h).unwrap();
        agg.build_arms(&img, &ARM_PARAMS);
        agg.arms().to_vec()
    }

    #[test]
    fn consistent_pixels_are_not_classified() {
        let (w, h) = (12, 2);
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut left = vec![3.0; w * h];
        let right = vec![3.4; w * h];
        refiner.outlier_detection(&mut left, &right);

        // Columns 0..3 map outside the right image
        assert_eq!(refiner.mismatches().len(), 3 * h);
        assert!(refiner.occlusions().is_empty());
        for y in 0..h {
            for x in 3..w {
                assert_eq!(left[y * w + x], 3.0);
                assert!(!refiner.mismatches().contains(&(x, y)));
            }
        }
    }

    #[test]
    fn inconsistent_pixels_split_into_occlusion_and_mismatch() {
        let (w, h) = (12, 1);
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut left = vec![2.0; w];
        let mut right = vec![2.0; w];
        // Background pixel at x = 6 whose match maps back to a foreground pixel at x = 8
        right[4] = 4.0;
        left[8] = 6.0;
        right[2] = 6.0;
        // Pixel at x = 10 whose match maps back to x = 3, which is not in front of it
        right[8] = -5.0;

        refiner.outlier_detection(&mut left, &right);

        assert!(refiner.occlusions().contains(&(6, 0)));
        assert!(refiner.mismatches().contains(&(10, 0)));
        assert!(left[6].is_infinite());
        assert!(left[10].is_infinite());
        for pix in refiner.occlusions() {
            assert!(!refiner.mismatches().contains(pix));
        }
    }

    #[test]
    fn disabled_check_only_collects_invalid_pixels() {
        let (w, h) = (6, 1);
        let mut p = params();
        p.do_lr_check = false;
        let mut refiner = MultiStepRefiner::new(w, h, &p).unwrap();

        let mut left = vec![1.0, INVALID_DISPARITY, 4.0, 4.0, 4.0, 4.0];
        let right = vec![9.0; w];
        refiner.outlier_detection(&mut left, &right);

        assert_eq!(refiner.mismatches(), &[(1, 0)]);
        assert_eq!(left[0], 1.0);
    }

    #[test]
    fn isolated_hole_is_voted_full() {
        let (w, h) = (9, 7);
        let data = vec![80u8; w * h * 3];
        let arms = flat_arms(w, h, &data);
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![5.0; w * h];
        disp[3 * w + 4] = INVALID_DISPARITY;
        refiner.mismatches.push((4, 3));

        refiner.iterative_region_voting(&mut disp, &arms);

        assert_eq!(disp[3 * w + 4], 5.0);
        assert!(refiner.mismatches().is_empty());
    }

    #[test]
    fn voting_never_grows_pending_sets() {
        let (w, h) = (10, 8);
        let data: Vec<u8> = (0..w * h * 3).map(|i| ((i / 3) % 7 * 3) as u8).collect();
        let arms = flat_arms(w, h, &data);
        let mut refiner = MultiStepRefiner::new(w, h, &Params::with_disparity(0, 16)).unwrap();

        let mut disp: Vec<f32> = (0..w * h).map(|i| (i % 5) as f32 + 2.0).collect();
        for i in (0..w * h).step_by(3) {
            disp[i] = INVALID_DISPARITY;
            if i % 2 == 0 {
                refiner.mismatches.push((i % w, i / w));
            }
            else {
                refiner.occlusions.push((i % w, i / w));
            }
        }

        let mut pending = refiner.mismatches().len() + refiner.occlusions().len();
        for _ in 0..VOTING_ITERATIONS {
            refiner.vote_once(&mut disp, &arms);
            let now = refiner.mismatches().len() + refiner.occlusions().len();
            assert!(now <= pending);
            pending = now;
        }
    }

    #[test]
    fn strict_thresholds_block_voting() {
        let (w, h) = (5, 5);
        let data = vec![80u8; w * h * 3];
        let arms = flat_arms(w, h, &data);
        let mut p = params();
        p.irv_ts = 1000;
        let mut refiner = MultiStepRefiner::new(w, h, &p).unwrap();

        let mut disp = vec![5.0; w * h];
        disp[12] = INVALID_DISPARITY;
        refiner.mismatches.push((2, 2));
        refiner.iterative_region_voting(&mut disp, &arms);

        assert!(disp[12].is_infinite());
        assert_eq!(refiner.mismatches(), &[(2, 2)]);
    }

    #[test]
    fn occlusions_interpolate_to_background() {
        let (w, h) = (9, 1);
        let data = vec![50u8; w * h * 3];
        let img = ColorView::new(w, h, &data).unwrap();
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![2.0, 2.0, 2.0, INVALID_DISPARITY, INVALID_DISPARITY, 9.0, 9.0, 9.0, 9.0];
        refiner.occlusions.push((3, 0));
        refiner.occlusions.push((4, 0));
        refiner.proper_interpolation(&mut disp, &img);

        assert_eq!(disp[3], 2.0);
        assert_eq!(disp[4], 2.0);
        assert!(refiner.occlusions().is_empty());
    }

    #[test]
    fn mismatches_interpolate_from_similar_colour() {
        let (w, h) = (7, 1);
        let mut data = vec![50u8; w * h * 3];
        for x in 4..w {
            for c in 0..3 {
                data[x * 3 + c] = 200;
            }
        }
        let img = ColorView::new(w, h, &data).unwrap();
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![1.0, 1.0, 1.0, INVALID_DISPARITY, 7.0, 7.0, 7.0];
        refiner.mismatches.push((3, 0));
        refiner.proper_interpolation(&mut disp, &img);

        assert_eq!(disp[3], 1.0);
    }

    #[test]
    fn rays_search_twice_the_disparity_bound() {
        let (w, h) = (20, 1);
        let data = vec![0u8; w * h * 3];
        let img = ColorView::new(w, h, &data).unwrap();
        let mut refiner = MultiStepRefiner::new(w, h, &Params::with_disparity(0, 8)).unwrap();

        let mut disp = vec![INVALID_DISPARITY; w];
        disp[10] = 3.0;
        refiner.mismatches.push((0, 0));
        refiner.proper_interpolation(&mut disp, &img);

        assert_eq!(disp[0], 3.0);
        assert!(refiner.mismatches().is_empty());

        // Just past the search length nothing is found
        let mut disp = vec![INVALID_DISPARITY; w];
        disp[16] = 3.0;
        refiner.mismatches.push((0, 0));
        refiner.proper_interpolation(&mut disp, &img);

        assert!(disp[0].is_infinite());
    }

    #[test]
    fn eight_rays_fill_mismatch_with_median() {
        let (w, h) = (7, 7);
        let data = vec![60u8; w * h * 3];
        let img = ColorView::new(w, h, &data).unwrap();
        let p = Params {
            interpolation: InterpolationRays::Eight,
            ..params()
        };
        let mut refiner = MultiStepRefiner::new(w, h, &p).unwrap();

        // Candidates 2 (right), 9 (below), 4 (left) and 7 (above) around the centre
        let mut disp = vec![INVALID_DISPARITY; w * h];
        disp[3 * w + 5] = 2.0;
        disp[5 * w + 3] = 9.0;
        disp[3 * w + 1] = 4.0;
        disp[w + 3] = 7.0;
        refiner.mismatches.push((3, 3));
        refiner.proper_interpolation(&mut disp, &img);

        // Sorted [2, 4, 7, 9], the upper median wins
        assert_eq!(disp[3 * w + 3], 7.0);

        // The same surroundings fill an occlusion with the smallest candidate
        disp[3 * w + 3] = INVALID_DISPARITY;
        refiner.occlusions.push((3, 3));
        refiner.proper_interpolation(&mut disp, &img);

        assert_eq!(disp[3 * w + 3], 2.0);
    }

    #[test]
    fn no_candidates_stays_pending() {
        let (w, h) = (3, 1);
        let data = vec![0u8; w * h * 3];
        let img = ColorView::new(w, h, &data).unwrap();
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![INVALID_DISPARITY; 3];
        refiner.mismatches.push((1, 0));
        refiner.proper_interpolation(&mut disp, &img);

        assert!(disp[1].is_infinite());
        assert_eq!(refiner.mismatches(), &[(1, 0)]);
    }

    #[test]
    fn discontinuity_snaps_to_cheaper_neighbour() {
        let (w, h) = (5, 3);
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![
            2.0, 2.0, 2.0, 10.0, 10.0,
            2.0, 2.0, 6.0, 10.0, 10.0,
            2.0, 2.0, 2.0, 10.0, 10.0,
        ];
        let mut cost = CostVolume::new(w, h, 16).unwrap();
        for y in 0..h {
            for x in 0..w {
                for d in 0..16 {
                    cost.set(x, y, d, 1.0);
                }
            }
        }
        cost.set(2, 1, 10, 0.2);

        refiner.discontinuity_adjustment(&mut disp, &cost);
        assert_eq!(disp[w + 2], 10.0);
    }

    #[test]
    fn median_removes_speckle() {
        let (w, h) = (3, 3);
        let mut refiner = MultiStepRefiner::new(w, h, &params()).unwrap();

        let mut disp = vec![4.0; 9];
        disp[4] = 15.0;
        disp[8] = INVALID_DISPARITY;
        refiner.median_filter(&mut disp);
        assert_eq!(disp[4], 4.0);

        let mut disp = vec![4.0; 9];
        disp[0] = INVALID_DISPARITY;
        refiner.median_filter(&mut disp);
        assert_eq!(disp[0], 4.0);
    }
}
