//! # AD-Census disparity computation
//!
//! This module provides an implementation of the AD-Census stereo matcher from
//! ("On Building an Accurate Stereo Matching System on Graphics Hardware")[https://doi.org/10.1109/ICCVW.2011.6130280]
//!
//! The pipeline runs strictly in order, each stage consuming the whole output of the previous:
//!
//! 1. AD-Census cost initialisation ([`cost`])
//! 2. Cross-based cost aggregation ([`cross`])
//! 3. Scanline optimisation ([`scanline`])
//! 4. Left and right winner-take-all with sub-pixel fitting ([`select`])
//! 5. Multi-step refinement ([`refine`])
//!
//! All buffers are allocated once by [`AdCensus::initialize`] and reused by every call to
//! [`AdCensus::match_images`]. One instance must not be shared between concurrent matches.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod color;
pub mod cost;
pub mod cross;
pub mod params;
pub mod refine;
pub mod scanline;
pub mod select;
pub mod volume;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use log::{debug, warn};

use self::color::ColorView;
use self::cost::CostComputer;
use self::cross::{ArmParams, CrossAggregator, AGGREGATION_ITERATIONS};
use self::refine::{MultiStepRefiner, RefineInput};
use self::scanline::ScanlineOptimizer;
use self::volume::CostVolume;
use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame, INVALID_DISPARITY};
use crate::error::*;

pub use self::params::{InterpolationRays, Params};

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// AD-Census stereo matcher.
///
/// Created uninitialised, it must be sized with [`AdCensus::initialize`] before matching.
#[derive(Default)]
pub struct AdCensus {
    state: Option<Workspace>
}

/// Everything owned by an initialised matcher.
struct Workspace {
    width: usize,
    height: usize,
    params: Params,
    cost_computer: CostComputer,
    aggregator: CrossAggregator,
    optimizer: ScanlineOptimizer,
    refiner: MultiStepRefiner,
    /// Cost volume, mutated in place by initialisation, aggregation and optimisation.
    cost: CostVolume,
    /// Ping-pong partner of `cost` during scanline optimisation.
    twin: CostVolume,
    disp_left: Vec<f32>,
    disp_right: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl AdCensus {
    /// Create an uninitialised matcher.
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Create a matcher initialised for images of the given size.
    pub fn with_size(width: usize, height: usize, params: Params) -> Result<Self> {
        let mut matcher = Self::new();
        matcher.initialize(width, height, params)?;
        Ok(matcher)
    }

    /// Allocate every buffer for images of `width` by `height` pixels.
    ///
    /// On failure the matcher is left uninitialised.
    pub fn initialize(&mut self, width: usize, height: usize, params: Params) -> Result<()> {
        self.state = None;

        if width == 0 || height == 0 {
            warn!("rejecting image size {}x{}", width, height);
            return Err(Error::InvalidDimensions { width, height });
        }
        params.validate()?;

        self.state = Some(Workspace::new(width, height, params)?);
        debug!("initialised for {}x{} images", width, height);

        Ok(())
    }

    /// Release every buffer, then initialise again.
    pub fn reset(&mut self, width: usize, height: usize, params: Params) -> Result<()> {
        self.release();
        self.initialize(width, height, params)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn width(&self) -> Option<usize> {
        self.state.as_ref().map(|ws| ws.width)
    }

    pub fn height(&self) -> Option<usize> {
        self.state.as_ref().map(|ws| ws.height)
    }

    pub fn params(&self) -> Option<&Params> {
        self.state.as_ref().map(|ws| &ws.params)
    }

    /// Compute the refined left disparity map of a rectified pair.
    ///
    /// `left` and `right` are interleaved RGB, row-major, without padding. Byte 0 of each pixel
    /// is red, so buffers in BGR order, as decoded by OpenCV, give different grayscale and census
    /// values and must be converted first. `out` receives
    /// `width * height` disparities, with `f32::INFINITY` for unresolved pixels. On error `out`
    /// is left untouched.
    pub fn match_images(&mut self, left: &[u8], right: &[u8], out: &mut [f32]) -> Result<()> {
        let ws = self.state.as_mut().ok_or(Error::NotInitialized)?;
        let (width, height) = (ws.width, ws.height);

        let left = ColorView::new(width, height, left).ok_or(Error::BufferSize {
            name: "left image",
            expected: width * height * 3,
            actual: left.len()
        })?;
        let right = ColorView::new(width, height, right).ok_or(Error::BufferSize {
            name: "right image",
            expected: width * height * 3,
            actual: right.len()
        })?;
        if out.len() != width * height {
            return Err(Error::BufferSize {
                name: "output disparity",
                expected: width * height,
                actual: out.len()
            });
        }

        ws.run(&left, &right);
        out.copy_from_slice(&ws.disp_left);

        Ok(())
    }

    fn release(&mut self) {
        self.state = None;
    }
}

impl Workspace {
    fn new(width: usize, height: usize, params: Params) -> Result<Self> {
        let range = params.disparity_range() as usize;

        Ok(Self {
            width,
            height,
            cost_computer: CostComputer::new(
                width,
                height,
                params.min_disparity,
                params.max_disparity
            )?,
            aggregator: CrossAggregator::new(width, height)?,
            optimizer: ScanlineOptimizer {
                min_disparity: params.min_disparity,
                p1: params.so_p1,
                p2: params.so_p2,
                tso: params.so_tso
            },
            refiner: MultiStepRefiner::new(width, height, &params)?,
            cost: CostVolume::new(width, height, range)?,
            twin: CostVolume::new(width, height, range)?,
            disp_left: try_alloc(width * height, INVALID_DISPARITY, "left disparity")?,
            disp_right: try_alloc(width * height, INVALID_DISPARITY, "right disparity")?,
            params
        })
    }

    /// Run the whole pipeline, leaving the result in `disp_left`.
    fn run(&mut self, left: &ColorView, right: &ColorView) {
        let params = &self.params;
        let start = Instant::now();

        self.cost_computer.compute(
            left,
            right,
            params.lambda_ad,
            params.lambda_census,
            &mut self.cost
        );
        debug!("cost initialisation done, elapsed {}ms", start.elapsed().as_millis());

        self.aggregator.build_arms(left, &ArmParams {
            l1: params.arm_limit(),
            l2: params.cross_l2,
            t1: params.cross_t1,
            t2: params.cross_t2
        });
        self.aggregator.aggregate(&mut self.cost, AGGREGATION_ITERATIONS);
        debug!("cost aggregation done, elapsed {}ms", start.elapsed().as_millis());

        self.optimizer.optimize(left, right, &mut self.cost, &mut self.twin);
        debug!("scanline optimisation done, elapsed {}ms", start.elapsed().as_millis());

        select::select_left(&self.cost, params.min_disparity, &mut self.disp_left);
        select::select_right(&self.cost, params.min_disparity, &mut self.disp_right);
        debug!("disparity selection done, elapsed {}ms", start.elapsed().as_millis());

        let input = RefineInput {
            cost: &self.cost,
            arms: self.aggregator.arms(),
            left,
            disp_right: &self.disp_right
        };
        self.refiner.refine(&input, &mut self.disp_left);
        debug!("multi-step refinement done, elapsed {}ms", start.elapsed().as_millis());
    }
}

impl DisparityAlgorithm for AdCensus {
    /// Compute the disparity map for the given frame.
    ///
    /// The matcher is resized, keeping its parameters, if the frame does not match the size it
    /// was initialised for.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        let (width, height) = frame.left.dimensions();
        let (width, height) = (width as usize, height as usize);

        if frame.right.dimensions() != frame.left.dimensions() {
            return Err(Error::BufferSize {
                name: "right image",
                expected: width * height * 3,
                actual: frame.right.as_raw().len()
            });
        }

        let params = self.params().cloned().ok_or(Error::NotInitialized)?;
        if self.width() != Some(width) || self.height() != Some(height) {
            self.reset(width, height, params)?;
        }

        let mut disp = vec![INVALID_DISPARITY; width * height];
        self.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut disp)?;

        let disp_map = DisparityMap::from_raw(width, height, disp)?;

        #[cfg(feature = "statistics")]
        plot_row_ranges(&disp_map)?;

        Ok(disp_map)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Plot the range of valid disparities on each row of the map.
#[cfg(feature = "statistics")]
fn plot_row_ranges(disp_map: &DisparityMap) -> Result<()> {
    let (min_disp, max_disp) = match disp_map.valid_range() {
        Some(r) => r,
        None => return Ok(())
    };

    let mut min_history: Vec<(f32, usize)> = Vec::new();
    let mut max_history: Vec<(f32, usize)> = Vec::new();
    for y in 0..disp_map.height() {
        let row = (0..disp_map.width()).filter_map(|x| disp_map.get(x, y));
        let (min, max) = row.fold((max_disp, min_disp), |(lo, hi), d| (lo.min(d), hi.max(d)));
        if min <= max {
            min_history.push((min, y));
            max_history.push((max, y));
        }
    }

    std::fs::create_dir_all("plots/adcensus")?;

    let disp_range = BitMapBackend::new(
        "plots/adcensus/disp_range.png",
        (800, 600)
    ).into_drawing_area();
    disp_range.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&disp_range)
        .caption("Row disparity range", ("sans-serif", 20).into_font())
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_ranged(min_disp..max_disp + 1.0, 0..disp_map.height())
        .map_err(plot_err)?;

    chart.configure_mesh().draw().map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(min_history, &RED))
        .map_err(plot_err)?
        .label("Min disparity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart
        .draw_series(LineSeries::new(max_history, &BLUE))
        .map_err(plot_err)?
        .label("Max disparity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(feature = "statistics")]
fn plot_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Plot(format!("{:?}", e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
