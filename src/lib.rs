//! # AD-Census Disparity
//!
//! This crate provides dense disparity map computation for rectified stereo pairs using the
//! AD-Census matcher.
//!
//! ```no_run
//! use adcensus_disparity::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let (width, height) = (450, 375);
//! let left = vec![0u8; width * height * 3];
//! let right = vec![0u8; width * height * 3];
//!
//! let mut matcher = AdCensus::with_size(width, height, Params::with_disparity(0, 64))?;
//! let mut disp = vec![INVALID_DISPARITY; width * height];
//! matcher.match_images(&left, &right, &mut disp)?;
//! # Ok(())
//! # }
//! ```

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
pub mod adcensus;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::adcensus::{AdCensus, InterpolationRays, Params};
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame, INVALID_DISPARITY};
    pub use crate::error::{Error, Result};
}
