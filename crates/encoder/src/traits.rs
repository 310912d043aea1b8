//! Encoder backend trait abstraction

use container::{PacketKind, PassMode, Timebase};
use frame_source::RawFrame;

use crate::CodecStatus;

/// Packet flag: the frame is decodable on its own
pub const FRAME_IS_KEY: u32 = 0x1;

/// Encoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Target bitrate in kbps
    pub target_bitrate_kbps: u32,
    /// Time unit of presentation timestamps
    pub timebase: Timebase,
    /// Encoding pass
    pub pass: PassMode,
    /// Request a keyframe every N frames
    pub keyframe_interval: Option<u32>,
}

impl EncoderConfig {
    /// Frames per second implied by the timebase
    pub fn fps(&self) -> f32 {
        if self.timebase.num == 0 {
            return 0.0;
        }
        self.timebase.den as f32 / self.timebase.num as f32
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            target_bitrate_kbps: 256,
            timebase: Timebase::per_frame(30),
            pass: PassMode::OnePass,
            keyframe_interval: Some(60), // Keyframe every 2 seconds at 30fps
        }
    }
}

/// Latency/quality tradeoff requested for one encode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deadline {
    /// Lowest latency
    #[default]
    Realtime,
}

/// Per-frame encode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeFlags {
    /// Encode this frame as a keyframe
    pub force_keyframe: bool,
}

/// A packet as emitted by a backend, before classification
#[derive(Debug, Clone, Copy)]
pub struct CodecPacket<'a> {
    pub kind: PacketKind,
    /// Payload, owned by the backend
    pub data: &'a [u8],
    pub pts: i64,
    pub duration: u64,
    /// `FRAME_IS_*` bits
    pub flags: u32,
}

/// Video encoder backend.
///
/// Mirrors a configure / initialize / encode / retrieve / destroy lifecycle.
/// After each [`EncodeBackend::encode`] call the caller drains
/// [`EncodeBackend::next_packet`] until it returns `None`.
pub trait EncodeBackend: Send {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Codec identifier written in the container header
    fn fourcc(&self) -> u32;

    /// Configuration the backend recommends
    fn default_config(&self) -> Result<EncoderConfig, CodecStatus>;

    /// Initialize the encoder context
    fn initialize(&mut self, config: &EncoderConfig) -> Result<(), CodecStatus>;

    /// Submit a frame, or `None` to flush buffered frames
    fn encode(
        &mut self,
        frame: Option<&RawFrame<'_>>,
        pts: i64,
        duration: u64,
        flags: EncodeFlags,
        deadline: Deadline,
    ) -> Result<(), CodecStatus>;

    /// Next pending output packet. The returned payload is invalidated by
    /// the next call.
    fn next_packet(&mut self) -> Option<CodecPacket<'_>>;

    /// Tear down the encoder context
    fn destroy(&mut self) -> Result<(), CodecStatus>;

    /// Extra detail about the most recent failure
    fn error_detail(&self) -> Option<String>;
}
