//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.
//!
//! Internally a disparity map stores `f32::INFINITY` for pixels without a disparity. That packed
//! form is only visible through [`DisparityMap::as_slice`]; every other accessor converts it into
//! an `Option<f32>` via [`DisparityMap::get`].

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, RgbImage};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Disparity value marking a pixel with no valid disparity.
pub const INVALID_DISPARITY: f32 = f32::INFINITY;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A generic floating point disparity map.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
    pub max_disp: Option<f32>,
    pub min_disp: Option<f32>
}

/// A rectified colour stereo pair.
pub struct StereoFrame {
    pub left: RgbImage,
    pub right: RgbImage
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// Create a map where every pixel is invalid.
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMap {
            width,
            height,
            data: vec![INVALID_DISPARITY; width * height],
            min_disp: None,
            max_disp: None
        }
    }

    /// Wrap a row-major buffer of disparities, using infinity for invalid pixels.
    pub fn from_raw(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::BufferSize {
                name: "disparity",
                expected: width * height,
                actual: data.len()
            });
        }

        let mut map = DisparityMap {
            width,
            height,
            data,
            min_disp: None,
            max_disp: None
        };

        if let Some((min, max)) = map.valid_range() {
            map.min_disp = Some(min);
            map.max_disp = Some(max);
        }

        Ok(map)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Disparity at the given pixel, or `None` if the pixel is invalid.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        let val = self.data[y * self.width + x];
        if val.is_finite() {
            Some(val)
        }
        else {
            None
        }
    }

    /// Set the disparity at the given pixel. `None` marks it invalid.
    pub fn put(&mut self, x: usize, y: usize, val: Option<f32>) {
        self.data[y * self.width + x] = val.unwrap_or(INVALID_DISPARITY);
    }

    /// The raw row-major buffer, with `f32::INFINITY` marking invalid pixels.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Minimum and maximum valid disparity in the map, if any pixel is valid.
    pub fn valid_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|d| d.is_finite())
            .fold(None, |acc, &d| match acc {
                None => Some((d, d)),
                Some((min, max)) => Some((min.min(d), max.max(d)))
            })
    }

    /// Convert into a depth map, `depth = focal * baseline / disparity`.
    ///
    /// Invalid and non-positive disparities have no depth and stay invalid. The returned map's
    /// `min_disp` and `max_disp` hold the depth range, so it can be normalised for display.
    pub fn to_depth(&self, focal: f32, baseline: f32) -> DisparityMap {
        let data = self.data
            .iter()
            .map(|&d| {
                if d.is_finite() && d > 0.0 {
                    focal * baseline / d
                }
                else {
                    INVALID_DISPARITY
                }
            })
            .collect();

        let mut depth = DisparityMap {
            width: self.width,
            height: self.height,
            data,
            min_disp: None,
            max_disp: None
        };

        if let Some((min, max)) = depth.valid_range() {
            depth.min_disp = Some(min);
            depth.max_disp = Some(max);
        }

        depth
    }

    /// Converts the image into a dynamic Luma8 image.
    ///
    /// Invalid pixels are drawn black.
    pub fn to_luma(&self) -> GrayImage {
        let mut new = image::GrayImage::new(self.width as u32, self.height as u32);

        for y in 0..new.height() {
            for x in 0..new.width() {
                let val = match self.get(x as usize, y as usize) {
                    Some(d) => d.max(0.0).min(255.0),
                    None => 0.0
                };

                *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
            }
        }

        new
    }

    /// Converts the image to a normalised GrayImage.
    ///
    /// Stretches the observed disparity range over 0..255. If the range is not set then the
    /// function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let (min, max) = match (self.min_disp, self.max_disp) {
            (Some(min), Some(max)) if max > min => (min, max),
            _ => return self.to_luma()
        };

        let mult = 255.0 / (max - min);

        let mut new = image::GrayImage::new(self.width as u32, self.height as u32);

        for y in 0..new.height() {
            for x in 0..new.width() {
                let val = match self.get(x as usize, y as usize) {
                    Some(d) => ((d - min) * mult).max(0.0).min(255.0),
                    None => 0.0
                };

                *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
            }
        }

        new
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
