//! # AD-Census parameters
//!
//! Parameters can be built in code, starting from `Params::default()`, or loaded from a JSON
//! file with the same field names.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Longest arm a cross can have, arms are stored as `u8`.
pub const MAX_ARM_LENGTH: i32 = 255;

/// Largest magnitude either disparity bound may have.
pub const MAX_DISPARITY_MAGNITUDE: i32 = 1 << 16;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    pub min_disparity: i32,
    pub max_disparity: i32,

    /// Decay of the absolute difference term.
    pub lambda_ad: i32,
    /// Decay of the census term.
    pub lambda_census: i32,

    /// Maximum arm length.
    pub cross_l1: i32,
    /// Arm length beyond which the tighter colour threshold `cross_t2` applies.
    pub cross_l2: i32,
    pub cross_t1: i32,
    pub cross_t2: i32,

    pub so_p1: f32,
    pub so_p2: f32,
    /// Colour gradient threshold used to soften the penalties.
    pub so_tso: i32,

    /// Minimum number of votes needed to fill a pixel.
    pub irv_ts: i32,
    /// Minimum share of the votes the winning disparity must have.
    pub irv_th: f32,

    pub lrcheck_thres: f32,

    pub do_lr_check: bool,
    pub do_region_voting: bool,
    pub do_interpolation: bool,
    pub do_discontinuity_adjustment: bool,

    #[serde(default)]
    pub interpolation: InterpolationRays
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Search pattern used to interpolate unresolved pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationRays {
    /// 16 rays, mismatches take the candidate closest in colour.
    Sixteen,
    /// 8 rays, mismatches take the median candidate.
    Eight
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for InterpolationRays {
    fn default() -> Self {
        InterpolationRays::Sixteen
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_disparity: 0,
            max_disparity: 64,
            lambda_ad: 10,
            lambda_census: 30,
            cross_l1: 34,
            cross_l2: 17,
            cross_t1: 20,
            cross_t2: 6,
            so_p1: 1.0,
            so_p2: 3.0,
            so_tso: 15,
            irv_ts: 20,
            irv_th: 0.4,
            lrcheck_thres: 1.0,
            do_lr_check: true,
            do_region_voting: true,
            do_interpolation: true,
            do_discontinuity_adjustment: false,
            interpolation: InterpolationRays::Sixteen
        }
    }
}

impl Params {
    /// Reference parameters with the given disparity bounds.
    pub fn with_disparity(min_disparity: i32, max_disparity: i32) -> Self {
        Self {
            min_disparity,
            max_disparity,
            ..Self::default()
        }
    }

    /// Parse parameters from a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(s)?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    /// Number of candidate disparities, `max_disparity - min_disparity`.
    pub fn disparity_range(&self) -> i64 {
        self.max_disparity as i64 - self.min_disparity as i64
    }

    /// Maximum arm length after capping to what an arm can store.
    pub fn arm_limit(&self) -> i32 {
        self.cross_l1.min(MAX_ARM_LENGTH).max(0)
    }

    /// Check the parameters describe a usable matcher.
    pub fn validate(&self) -> Result<()> {
        if self.disparity_range() <= 0 {
            return Err(Error::EmptyDisparityRange {
                min: self.min_disparity,
                max: self.max_disparity
            });
        }

        for &(name, bound) in [
            ("min_disparity", self.min_disparity),
            ("max_disparity", self.max_disparity)
        ].iter() {
            if bound.unsigned_abs() > MAX_DISPARITY_MAGNITUDE as u32 {
                return Err(Error::InvalidParam {
                    name,
                    reason: format!(
                        "must lie within +/-{}, got {}",
                        MAX_DISPARITY_MAGNITUDE,
                        bound
                    )
                });
            }
        }

        if self.lambda_ad <= 0 {
            return Err(Error::InvalidParam {
                name: "lambda_ad",
                reason: format!("must be positive, got {}", self.lambda_ad)
            });
        }

        if self.lambda_census <= 0 {
            return Err(Error::InvalidParam {
                name: "lambda_census",
                reason: format!("must be positive, got {}", self.lambda_census)
            });
        }

        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
