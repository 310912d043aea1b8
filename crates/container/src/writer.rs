//! Streaming container writer

use std::io::{Seek, SeekFrom, Write};

use tracing::debug;

use crate::{write_frame_header, ContainerResult, EncodedPacket, StreamInfo};

/// Writes a container to a seekable sink.
///
/// The file header is written up front with a zero frame count and patched
/// by [`IvfWriter::finish`] once the real count is known.
pub struct IvfWriter<W: Write + Seek> {
    sink: W,
    stream: StreamInfo,
    frames_written: u32,
    bytes_written: u64,
}

impl<W: Write + Seek> IvfWriter<W> {
    pub fn create(mut sink: W, stream: StreamInfo) -> ContainerResult<Self> {
        let mut bytes_written = 0;
        if let Some(header) = stream.file_header(0)? {
            let bytes = header.to_bytes();
            sink.write_all(&bytes)?;
            bytes_written = bytes.len() as u64;
        } else {
            debug!("Pass {:?} carries no file header", stream.pass);
        }

        Ok(Self {
            sink,
            stream,
            frames_written: 0,
            bytes_written,
        })
    }

    /// Write one packet. Returns `false` for packets that are not
    /// compressed frames.
    pub fn write_packet(&mut self, packet: &EncodedPacket<'_>) -> ContainerResult<bool> {
        let (Some(header), Some(frame)) = (write_frame_header(packet)?, packet.as_frame()) else {
            return Ok(false);
        };

        self.sink.write_all(&header)?;
        self.sink.write_all(frame.data)?;

        self.frames_written += 1;
        self.bytes_written += (header.len() + frame.data.len()) as u64;
        Ok(true)
    }

    /// Rewrite the file header with the final frame count and hand the sink back
    pub fn finish(mut self) -> ContainerResult<(W, u32)> {
        if let Some(header) = self.stream.file_header(self.frames_written)? {
            self.sink.seek(SeekFrom::Start(0))?;
            self.sink.write_all(&header.to_bytes())?;
            self.sink.seek(SeekFrom::End(0))?;
        }
        self.sink.flush()?;

        debug!(
            "Container finished: {} frames, {} bytes",
            self.frames_written, self.bytes_written
        );
        Ok((self.sink, self.frames_written))
    }
}
