//! OpenH264 backend implementation

use container::{PacketKind, FOURCC_H264};
use frame_source::RawFrame;
use openh264::encoder::{
    BitRate, Encoder, EncoderConfig as OpenH264Config, FrameRate, RateControlMode,
};
use openh264::formats::YUVSlices;
use openh264::{nal_units, OpenH264API};
use tracing::{debug, info};

use crate::{
    CodecPacket, CodecStatus, Deadline, EncodeBackend, EncodeFlags, EncoderConfig, FRAME_IS_KEY,
};

/// NAL unit type of an IDR slice
const NAL_IDR_SLICE: u8 = 5;

#[derive(Debug)]
struct FramePacket {
    data: Vec<u8>,
    pts: i64,
    duration: u64,
    keyframe: bool,
}

/// OpenH264-based software backend.
///
/// OpenH264 emits one access unit per input frame and never buffers, so
/// each encode call queues at most one packet and a flush yields nothing.
pub struct OpenH264Backend {
    encoder: Option<Encoder>,
    config: EncoderConfig,
    pending: Option<FramePacket>,
    current: Option<FramePacket>,
    detail: Option<String>,
}

impl OpenH264Backend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self {
            encoder: None,
            config: EncoderConfig::default(),
            pending: None,
            current: None,
            detail: None,
        }
    }

    fn fail(&mut self, status: CodecStatus, detail: impl Into<String>) -> CodecStatus {
        self.detail = Some(detail.into());
        status
    }
}

impl Default for OpenH264Backend {
    fn default() -> Self {
        Self::new()
    }
}

/// NAL unit type, skipping an Annex-B start code if present
fn nal_type(nal: &[u8]) -> Option<u8> {
    let start = nal.iter().position(|&b| b != 0)?;
    let header = if nal[start] == 1 && start >= 2 {
        *nal.get(start + 1)?
    } else {
        nal[start]
    };
    Some(header & 0x1F)
}

impl EncodeBackend for OpenH264Backend {
    fn name(&self) -> &str {
        "OpenH264 H.264 encoder"
    }

    fn fourcc(&self) -> u32 {
        FOURCC_H264
    }

    fn default_config(&self) -> Result<EncoderConfig, CodecStatus> {
        Ok(EncoderConfig::default())
    }

    fn initialize(&mut self, config: &EncoderConfig) -> Result<(), CodecStatus> {
        if config.timebase.num == 0 || config.timebase.den == 0 {
            return Err(self.fail(CodecStatus::InvalidParam, "timebase must be non-zero"));
        }

        info!(
            "Initializing OpenH264 encoder: {}x{} @ {} kbps, {:.2} fps",
            config.width,
            config.height,
            config.target_bitrate_kbps,
            config.fps()
        );

        let bitrate_bps = config.target_bitrate_kbps.max(1).saturating_mul(1000);
        let openh264_config = OpenH264Config::new()
            .bitrate(BitRate::from_bps(bitrate_bps))
            .max_frame_rate(FrameRate::from_hz(config.fps()))
            .rate_control_mode(RateControlMode::Bitrate)
            .skip_frames(false);

        let encoder = Encoder::with_api_config(OpenH264API::from_source(), openh264_config)
            .map_err(|e| self.fail(CodecStatus::Error, e.to_string()))?;

        self.encoder = Some(encoder);
        self.config = config.clone();
        self.pending = None;
        self.current = None;
        self.detail = None;

        Ok(())
    }

    fn encode(
        &mut self,
        frame: Option<&RawFrame<'_>>,
        pts: i64,
        duration: u64,
        flags: EncodeFlags,
        _deadline: Deadline,
    ) -> Result<(), CodecStatus> {
        self.pending = None;
        self.current = None;

        if self.encoder.is_none() {
            return Err(self.fail(CodecStatus::Error, "encoder not initialized"));
        }

        // Nothing is buffered in real-time mode
        let Some(raw) = frame else {
            return Ok(());
        };

        let res = raw.resolution();
        if res.width() != self.config.width || res.height() != self.config.height {
            let detail = format!(
                "frame is {}x{}, encoder configured for {}x{}",
                res.width(),
                res.height(),
                self.config.width,
                self.config.height
            );
            return Err(self.fail(CodecStatus::InvalidParam, detail));
        }

        let w = res.width() as usize;
        let h = res.height() as usize;
        let yuv = YUVSlices::new((raw.y(), raw.u(), raw.v()), (w, h), (w, w / 2, w / 2));

        let result = match self.encoder.as_mut() {
            Some(encoder) => {
                if flags.force_keyframe {
                    encoder.force_intra_frame();
                    debug!("Forcing intra frame at pts {}", pts);
                }
                encoder
                    .encode(&yuv)
                    .map(|bitstream| bitstream.to_vec())
                    .map_err(|e| e.to_string())
            }
            None => Err("encoder not initialized".to_string()),
        };

        let bitstream = match result {
            Ok(bitstream) => bitstream,
            Err(detail) => return Err(self.fail(CodecStatus::Error, detail)),
        };

        if bitstream.is_empty() {
            debug!("Encoder skipped frame at pts {}", pts);
            return Ok(());
        }

        let keyframe = nal_units(&bitstream).any(|nal| nal_type(nal) == Some(NAL_IDR_SLICE));

        self.pending = Some(FramePacket {
            data: bitstream,
            pts,
            duration,
            keyframe,
        });
        Ok(())
    }

    fn next_packet(&mut self) -> Option<CodecPacket<'_>> {
        self.current = self.pending.take();
        self.current.as_ref().map(|p| CodecPacket {
            kind: PacketKind::Frame,
            data: &p.data,
            pts: p.pts,
            duration: p.duration,
            flags: if p.keyframe { FRAME_IS_KEY } else { 0 },
        })
    }

    fn destroy(&mut self) -> Result<(), CodecStatus> {
        self.pending = None;
        self.current = None;
        match self.encoder.take() {
            Some(encoder) => {
                drop(encoder);
                Ok(())
            }
            None => Err(self.fail(CodecStatus::Error, "encoder not initialized")),
        }
    }

    fn error_detail(&self) -> Option<String> {
        self.detail.clone()
    }
}
