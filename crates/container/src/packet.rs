//! Encoded packet definitions

use bytes::Bytes;

/// Category of a packet emitted by an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Compressed frame data
    Frame,
    /// First-pass rate control statistics
    TwoPassStats,
    /// Per-frame quality measurement
    Psnr,
    /// Backend-specific data
    Custom,
}

/// A compressed frame borrowed from the encoder's output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedFrame<'a> {
    /// Compressed payload, valid until the next packet is requested
    pub data: &'a [u8],
    /// Presentation timestamp in timebase units
    pub pts: i64,
    /// Duration in timebase units
    pub duration: u64,
    /// Decodable without reference to earlier frames
    pub keyframe: bool,
}

/// Classified encoder output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedPacket<'a> {
    Frame(CompressedFrame<'a>),
    /// A packet category the container does not carry
    Other(PacketKind),
}

impl<'a> EncodedPacket<'a> {
    pub fn kind(&self) -> PacketKind {
        match self {
            EncodedPacket::Frame(_) => PacketKind::Frame,
            EncodedPacket::Other(kind) => *kind,
        }
    }

    pub fn as_frame(&self) -> Option<&CompressedFrame<'a>> {
        match self {
            EncodedPacket::Frame(frame) => Some(frame),
            EncodedPacket::Other(_) => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        self.as_frame().is_some_and(|f| f.keyframe)
    }

    /// Copy the payload out of the encoder's buffer
    pub fn to_owned_packet(&self) -> OwnedPacket {
        match self {
            EncodedPacket::Frame(frame) => OwnedPacket::Frame(OwnedFrame {
                data: Bytes::copy_from_slice(frame.data),
                pts: frame.pts,
                duration: frame.duration,
                keyframe: frame.keyframe,
            }),
            EncodedPacket::Other(kind) => OwnedPacket::Other(*kind),
        }
    }
}

/// A compressed frame that owns its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    pub data: Bytes,
    pub pts: i64,
    pub duration: u64,
    pub keyframe: bool,
}

/// Encoder output detached from the encoder's buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedPacket {
    Frame(OwnedFrame),
    Other(PacketKind),
}

impl OwnedPacket {
    pub fn as_packet(&self) -> EncodedPacket<'_> {
        match self {
            OwnedPacket::Frame(frame) => EncodedPacket::Frame(CompressedFrame {
                data: &frame.data,
                pts: frame.pts,
                duration: frame.duration,
                keyframe: frame.keyframe,
            }),
            OwnedPacket::Other(kind) => EncodedPacket::Other(*kind),
        }
    }
}
