//! Stream-level descriptors shared by the encoder and the container

use crate::{ContainerError, ContainerResult, FileHeader};

/// Frame rate expressed as a rational time unit (`num / den` seconds per tick)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebase {
    pub num: u32,
    pub den: u32,
}

impl Timebase {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// One tick per frame at `fps` frames per second
    pub const fn per_frame(fps: u32) -> Self {
        Self { num: 1, den: fps }
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::per_frame(30)
    }
}

/// Encoding pass of the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassMode {
    /// Single-pass encoding
    #[default]
    OnePass,
    /// Statistics-gathering first pass of a two-pass encode
    FirstPass,
    /// Final pass of a two-pass encode
    LastPass,
}

impl PassMode {
    /// Whether a container produced in this pass carries a file header
    pub fn writes_file_header(&self) -> bool {
        matches!(self, PassMode::OnePass | PassMode::LastPass)
    }
}

/// Everything the container needs to know about a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub fourcc: u32,
    pub width: u32,
    pub height: u32,
    pub timebase: Timebase,
    pub pass: PassMode,
}

impl StreamInfo {
    /// Build the file header for this stream, or `None` when the pass mode
    /// produces no header
    pub fn file_header(&self, frame_count: u32) -> ContainerResult<Option<FileHeader>> {
        if !self.pass.writes_file_header() {
            return Ok(None);
        }

        let width =
            u16::try_from(self.width).map_err(|_| ContainerError::DimensionOverflow(self.width))?;
        let height = u16::try_from(self.height)
            .map_err(|_| ContainerError::DimensionOverflow(self.height))?;

        Ok(Some(FileHeader {
            fourcc: self.fourcc,
            width,
            height,
            rate: self.timebase.den,
            scale: self.timebase.num,
            frame_count,
        }))
    }
}
