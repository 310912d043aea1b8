//! Raw planar YUV stream reader

use std::io::{ErrorKind, Read};

use tracing::{debug, warn};

use crate::{FrameResult, FrameSource, RawFrame, ReadOutcome, Resolution};

/// Reads back-to-back I420 frames from a byte stream
pub struct YuvReader<R: Read> {
    source: R,
    resolution: Resolution,
    buffer: Vec<u8>,
    frames_read: u64,
}

impl<R: Read> YuvReader<R> {
    pub fn new(source: R, resolution: Resolution) -> Self {
        Self {
            source,
            resolution,
            buffer: vec![0u8; resolution.frame_len()],
            frames_read: 0,
        }
    }

    fn fill(&mut self) -> FrameResult<usize> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.source.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameSource for YuvReader<R> {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self) -> FrameResult<ReadOutcome<'_>> {
        let expected = self.buffer.len();
        let got = self.fill()?;

        if got == 0 {
            debug!("End of input after {} frames", self.frames_read);
            return Ok(ReadOutcome::End);
        }

        if got != expected {
            warn!(
                "Read partial frame ({} of {} bytes). Check your width & height!",
                got, expected
            );
            return Ok(ReadOutcome::Partial { expected, got });
        }

        self.frames_read += 1;
        Ok(ReadOutcome::Frame(RawFrame::new(
            &self.buffer,
            self.resolution,
        )?))
    }
}
