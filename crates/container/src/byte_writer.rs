//! Little-endian primitive serialization

use bytes::{Buf, BufMut, BytesMut};

use crate::{ContainerError, ContainerResult};

/// Growable little-endian byte sink
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_le16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn put_le32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    /// Write a four-character ASCII tag verbatim
    pub fn put_tag(&mut self, tag: &[u8; 4]) -> &mut Self {
        self.buf.put_slice(tag);
        self
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Bounds-checked little-endian reader over a byte slice
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn ensure(&self, needed: usize) -> ContainerResult<()> {
        if self.buf.remaining() < needed {
            return Err(ContainerError::Truncated {
                needed,
                got: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_le16(&mut self) -> ContainerResult<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn get_le32(&mut self) -> ContainerResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn get_tag(&mut self) -> ContainerResult<[u8; 4]> {
        self.ensure(4)?;
        let mut tag = [0u8; 4];
        self.buf.copy_to_slice(&mut tag);
        Ok(tag)
    }
}
