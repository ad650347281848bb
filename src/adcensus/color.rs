//! # Colour buffer access
//!
//! Borrowed view over an interleaved, row-major, unpadded 3 byte per pixel buffer.

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct ColorView<'a> {
    width: usize,
    height: usize,
    data: &'a [u8]
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<'a> ColorView<'a> {
    /// Wrap a buffer, which must be exactly `width * height * 3` bytes long.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        if data.len() != width * height * 3 {
            return None;
        }

        Some(Self {
            width,
            height,
            data
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Largest per-channel absolute difference between two colours.
#[inline]
pub fn color_dist(a: [u8; 3], b: [u8; 3]) -> i32 {
    let dr = (a[0] as i32 - b[0] as i32).abs();
    let dg = (a[1] as i32 - b[1] as i32).abs();
    let db = (a[2] as i32 - b[2] as i32).abs();
    dr.max(dg).max(db)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
