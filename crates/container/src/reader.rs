//! Container reader

use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::{
    ContainerError, ContainerResult, FileHeader, FrameHeader, FILE_HEADER_LEN, FRAME_HEADER_LEN,
};

/// One frame record read back from a container
#[derive(Debug, Clone)]
pub struct IvfFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

/// Reads frame records from a container that starts with a file header
pub struct IvfReader<R: Read> {
    source: R,
    header: FileHeader,
}

impl<R: Read> IvfReader<R> {
    pub fn open(mut source: R) -> ContainerResult<Self> {
        let mut bytes = [0u8; FILE_HEADER_LEN];
        let got = read_full(&mut source, &mut bytes)?;
        if got != FILE_HEADER_LEN {
            return Err(ContainerError::Truncated {
                needed: FILE_HEADER_LEN,
                got,
            });
        }

        let header = FileHeader::parse(&bytes)?;
        Ok(Self { source, header })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read the next frame record, or `None` at a clean end of stream
    pub fn next_frame(&mut self) -> ContainerResult<Option<IvfFrame>> {
        let mut bytes = [0u8; FRAME_HEADER_LEN];
        match read_full(&mut self.source, &mut bytes)? {
            0 => return Ok(None),
            FRAME_HEADER_LEN => {}
            got => {
                return Err(ContainerError::Truncated {
                    needed: FRAME_HEADER_LEN,
                    got,
                })
            }
        }

        let header = FrameHeader::parse(&bytes)?;
        let needed = header.size as usize;
        // Buffer grows with the bytes actually present, not the declared size
        let mut payload = Vec::new();
        let got = (&mut self.source)
            .take(u64::from(header.size))
            .read_to_end(&mut payload)?;
        if got != needed {
            return Err(ContainerError::Truncated { needed, got });
        }

        Ok(Some(IvfFrame {
            header,
            payload: Bytes::from(payload),
        }))
    }
}

/// Fill `buf` as far as the source allows, returning the number of bytes read
pub(crate) fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
