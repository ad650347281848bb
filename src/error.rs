//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize
    },

    #[error("Disparity range is empty (min {min}, max {max})")]
    EmptyDisparityRange {
        min: i32,
        max: i32
    },

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String
    },

    #[error("Could not allocate the {0} buffer")]
    Allocation(&'static str),

    #[error("The matcher has not been initialised")]
    NotInitialized,

    #[error("Buffer `{name}` has length {actual}, expected {expected}")]
    BufferSize {
        name: &'static str,
        expected: usize,
        actual: usize
    },

    #[error("Could not read the parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse parameters: {0}")]
    ParamsParse(#[from] serde_json::Error),

    #[error("Error was thrown while plotting statistics: {0}")]
    Plot(String)
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Allocate a vector of `len` copies of `fill`, reporting failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Allocation(what))?;
    buf.resize(len, fill);
    Ok(buf)
}
