//! Packet classification

use container::{CompressedFrame, EncodedPacket, PacketKind};

use crate::{CodecPacket, FRAME_IS_KEY};

/// Sort a backend packet into a compressed frame or some other category.
///
/// The payload stays borrowed from the backend.
pub fn classify<'a>(packet: &CodecPacket<'a>) -> EncodedPacket<'a> {
    match packet.kind {
        PacketKind::Frame => EncodedPacket::Frame(CompressedFrame {
            data: packet.data,
            pts: packet.pts,
            duration: packet.duration,
            keyframe: packet.flags & FRAME_IS_KEY != 0,
        }),
        other => EncodedPacket::Other(other),
    }
}
