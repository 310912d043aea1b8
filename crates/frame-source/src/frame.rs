//! Raw frame data structures

use crate::{FrameError, FrameResult};

/// Smallest accepted frame edge in pixels
pub const MIN_DIMENSION: u32 = 16;

/// Validated frame dimensions for planar 4:2:0 input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Both edges must be even and at least [`MIN_DIMENSION`]
    pub fn new(width: u32, height: u32) -> FrameResult<Self> {
        let valid = |v: u32| v >= MIN_DIMENSION && v % 2 == 0;
        if !valid(width) || !valid(height) {
            return Err(FrameError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of one half-resolution chroma plane
    pub fn chroma_len(&self) -> usize {
        (self.width as usize / 2) * (self.height as usize / 2)
    }

    /// Total bytes in one frame: `width * height * 3 / 2`
    pub fn frame_len(&self) -> usize {
        self.luma_len() + 2 * self.chroma_len()
    }
}

/// Immutable view over one planar 4:2:0 frame
///
/// The luma plane comes first, followed by the two chroma planes.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    data: &'a [u8],
    resolution: Resolution,
}

impl<'a> RawFrame<'a> {
    pub fn new(data: &'a [u8], resolution: Resolution) -> FrameResult<Self> {
        if data.len() != resolution.frame_len() {
            return Err(FrameError::SizeMismatch {
                expected: resolution.frame_len(),
                actual: data.len(),
            });
        }
        Ok(Self { data, resolution })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn y(&self) -> &'a [u8] {
        &self.data[..self.resolution.luma_len()]
    }

    pub fn u(&self) -> &'a [u8] {
        let start = self.resolution.luma_len();
        &self.data[start..start + self.resolution.chroma_len()]
    }

    pub fn v(&self) -> &'a [u8] {
        let start = self.resolution.luma_len() + self.resolution.chroma_len();
        &self.data[start..]
    }
}
