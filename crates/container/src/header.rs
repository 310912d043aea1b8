//! File and frame header records
//!
//! All multi-byte fields are little-endian. The file header layout is:
//!
//! | offset | size | field        |
//! |--------|------|--------------|
//! | 0      | 4    | magic "DKIF" |
//! | 4      | 2    | version (0)  |
//! | 6      | 2    | header size  |
//! | 8      | 4    | fourcc       |
//! | 12     | 2    | width        |
//! | 14     | 2    | height       |
//! | 16     | 4    | rate         |
//! | 20     | 4    | scale        |
//! | 24     | 4    | frame count  |
//! | 28     | 4    | reserved     |
//!
//! Each frame is a 12-byte header (size, pts low, pts high) followed by
//! `size` payload bytes.

use bytes::BufMut;

use crate::{
    ByteReader, ByteWriter, CompressedFrame, ContainerError, ContainerResult, EncodedPacket,
    StreamInfo, FILE_HEADER_LEN, FRAME_HEADER_LEN, MAGIC, VERSION,
};

/// Stream-level file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub fourcc: u32,
    pub width: u16,
    pub height: u16,
    /// Timebase denominator
    pub rate: u32,
    /// Timebase numerator
    pub scale: u32,
    pub frame_count: u32,
}

impl FileHeader {
    pub fn write_to<B: BufMut>(&self, out: &mut B) {
        out.put_slice(&self.to_bytes());
    }

    pub fn to_bytes(&self) -> [u8; FILE_HEADER_LEN] {
        let mut w = ByteWriter::with_capacity(FILE_HEADER_LEN);
        w.put_tag(&MAGIC)
            .put_le16(VERSION)
            .put_le16(FILE_HEADER_LEN as u16)
            .put_le32(self.fourcc)
            .put_le16(self.width)
            .put_le16(self.height)
            .put_le32(self.rate)
            .put_le32(self.scale)
            .put_le32(self.frame_count)
            .put_le32(0);

        let mut bytes = [0u8; FILE_HEADER_LEN];
        bytes.copy_from_slice(w.as_slice());
        bytes
    }

    pub fn parse(data: &[u8]) -> ContainerResult<Self> {
        let mut r = ByteReader::new(data);

        let magic = r.get_tag()?;
        if magic != MAGIC {
            return Err(ContainerError::BadMagic(magic));
        }

        let version = r.get_le16()?;
        if version != VERSION {
            return Err(ContainerError::UnsupportedVersion(version));
        }

        let header_size = r.get_le16()?;
        if header_size as usize != FILE_HEADER_LEN {
            return Err(ContainerError::BadHeaderSize(header_size));
        }

        let header = Self {
            fourcc: r.get_le32()?,
            width: r.get_le16()?,
            height: r.get_le16()?,
            rate: r.get_le32()?,
            scale: r.get_le32()?,
            frame_count: r.get_le32()?,
        };
        // reserved
        r.get_le32()?;

        Ok(header)
    }
}

/// Header preceding each compressed frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload size in bytes
    pub size: u32,
    pub pts: u64,
}

impl FrameHeader {
    pub fn for_frame(frame: &CompressedFrame<'_>) -> ContainerResult<Self> {
        let size = u32::try_from(frame.data.len())
            .map_err(|_| ContainerError::PayloadTooLarge(frame.data.len()))?;
        Ok(Self {
            size,
            pts: frame.pts as u64,
        })
    }

    pub fn timestamp_low(&self) -> u32 {
        (self.pts & 0xFFFF_FFFF) as u32
    }

    pub fn timestamp_high(&self) -> u32 {
        (self.pts >> 32) as u32
    }

    pub fn write_to<B: BufMut>(&self, out: &mut B) {
        out.put_slice(&self.to_bytes());
    }

    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut w = ByteWriter::with_capacity(FRAME_HEADER_LEN);
        w.put_le32(self.size)
            .put_le32(self.timestamp_low())
            .put_le32(self.timestamp_high());

        let mut bytes = [0u8; FRAME_HEADER_LEN];
        bytes.copy_from_slice(w.as_slice());
        bytes
    }

    pub fn parse(data: &[u8]) -> ContainerResult<Self> {
        let mut r = ByteReader::new(data);
        let size = r.get_le32()?;
        let low = r.get_le32()? as u64;
        let high = r.get_le32()? as u64;
        Ok(Self {
            size,
            pts: (high << 32) | low,
        })
    }
}

/// Serialize the file header into `out`.
///
/// Returns `false` without writing anything when the stream's pass mode
/// carries no header.
pub fn write_file_header<B: BufMut>(
    out: &mut B,
    stream: &StreamInfo,
    frame_count: u32,
) -> ContainerResult<bool> {
    match stream.file_header(frame_count)? {
        Some(header) => {
            header.write_to(out);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Frame header bytes for `packet`, or `None` if it is not a compressed frame
pub fn write_frame_header(
    packet: &EncodedPacket<'_>,
) -> ContainerResult<Option<[u8; FRAME_HEADER_LEN]>> {
    match packet {
        EncodedPacket::Frame(frame) => Ok(Some(FrameHeader::for_frame(frame)?.to_bytes())),
        EncodedPacket::Other(_) => Ok(None),
    }
}
