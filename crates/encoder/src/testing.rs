//! Deterministic backend for exercising sessions without a real codec

use std::collections::VecDeque;
use std::sync::Arc;

use container::PacketKind;
use frame_source::{RawFrame, Resolution};
use parking_lot::Mutex;

use crate::{
    CodecPacket, CodecStatus, Deadline, EncodeBackend, EncodeFlags, EncoderConfig, FRAME_IS_KEY,
};

#[derive(Debug, Clone)]
pub(crate) struct EncodeCall {
    pub had_frame: bool,
    pub pts: i64,
    pub duration: u64,
    pub flags: EncodeFlags,
    pub deadline: Deadline,
}

/// Everything the backend was asked to do
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub default_config_calls: u32,
    pub initialized: Option<EncoderConfig>,
    pub encodes: Vec<EncodeCall>,
    pub destroy_calls: u32,
}

#[derive(Debug)]
struct Pending {
    kind: PacketKind,
    data: Vec<u8>,
    pts: i64,
    flags: u32,
}

/// Holds `lookahead` frames back before releasing them, like a codec with
/// lag-in-frames enabled
pub(crate) struct ScriptedBackend {
    log: Arc<Mutex<CallLog>>,
    lookahead: usize,
    stats_packets: bool,
    init_failure: Option<(CodecStatus, String)>,
    encode_failure: Option<(i64, String)>,
    destroy_failure: Option<String>,
    held: VecDeque<Pending>,
    ready: VecDeque<Pending>,
    current: Option<Pending>,
    detail: Option<String>,
}

impl ScriptedBackend {
    pub const FOURCC: u32 = u32::from_le_bytes(*b"TEST");

    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(CallLog::default())),
            lookahead: 0,
            stats_packets: false,
            init_failure: None,
            encode_failure: None,
            destroy_failure: None,
            held: VecDeque::new(),
            ready: VecDeque::new(),
            current: None,
            detail: None,
        }
    }

    pub fn with_lookahead(mut self, frames: usize) -> Self {
        self.lookahead = frames;
        self
    }

    /// Emit a first-pass statistics packet ahead of every frame
    pub fn with_stats_packets(mut self) -> Self {
        self.stats_packets = true;
        self
    }

    pub fn fail_init(mut self, status: CodecStatus, detail: &str) -> Self {
        self.init_failure = Some((status, detail.to_string()));
        self
    }

    pub fn fail_encode_at(mut self, pts: i64, detail: &str) -> Self {
        self.encode_failure = Some((pts, detail.to_string()));
        self
    }

    pub fn fail_destroy(mut self, detail: &str) -> Self {
        self.destroy_failure = Some(detail.to_string());
        self
    }

    pub fn log(&self) -> Arc<Mutex<CallLog>> {
        self.log.clone()
    }

    fn release(&mut self, frame: Pending) {
        if self.stats_packets {
            self.ready.push_back(Pending {
                kind: PacketKind::TwoPassStats,
                data: vec![0xFF; 4],
                pts: frame.pts,
                flags: 0,
            });
        }
        self.ready.push_back(frame);
    }
}

impl EncodeBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted test backend"
    }

    fn fourcc(&self) -> u32 {
        Self::FOURCC
    }

    fn default_config(&self) -> Result<EncoderConfig, CodecStatus> {
        self.log.lock().default_config_calls += 1;
        Ok(EncoderConfig::default())
    }

    fn initialize(&mut self, config: &EncoderConfig) -> Result<(), CodecStatus> {
        if let Some((status, detail)) = &self.init_failure {
            self.detail = Some(detail.clone());
            return Err(*status);
        }
        self.log.lock().initialized = Some(config.clone());
        Ok(())
    }

    fn encode(
        &mut self,
        frame: Option<&RawFrame<'_>>,
        pts: i64,
        duration: u64,
        flags: EncodeFlags,
        deadline: Deadline,
    ) -> Result<(), CodecStatus> {
        self.log.lock().encodes.push(EncodeCall {
            had_frame: frame.is_some(),
            pts,
            duration,
            flags,
            deadline,
        });

        if let Some((fail_pts, detail)) = &self.encode_failure {
            if *fail_pts == pts {
                self.detail = Some(detail.clone());
                return Err(CodecStatus::Error);
            }
        }

        // Each retrieval round starts fresh
        self.ready.clear();
        self.current = None;

        match frame {
            Some(raw) => {
                let mut data = raw.y()[..8.min(raw.y().len())].to_vec();
                data.extend(std::iter::repeat_n(pts as u8, 1 + (pts as usize % 7)));
                self.held.push_back(Pending {
                    kind: PacketKind::Frame,
                    data,
                    pts,
                    flags: if flags.force_keyframe { FRAME_IS_KEY } else { 0 },
                });
                while self.held.len() > self.lookahead {
                    if let Some(frame) = self.held.pop_front() {
                        self.release(frame);
                    }
                }
            }
            None => {
                while let Some(frame) = self.held.pop_front() {
                    self.release(frame);
                }
            }
        }
        Ok(())
    }

    fn next_packet(&mut self) -> Option<CodecPacket<'_>> {
        self.current = self.ready.pop_front();
        self.current.as_ref().map(|p| CodecPacket {
            kind: p.kind,
            data: &p.data,
            pts: p.pts,
            duration: 1,
            flags: p.flags,
        })
    }

    fn destroy(&mut self) -> Result<(), CodecStatus> {
        self.log.lock().destroy_calls += 1;
        if let Some(detail) = &self.destroy_failure {
            self.detail = Some(detail.clone());
            return Err(CodecStatus::Error);
        }
        Ok(())
    }

    fn error_detail(&self) -> Option<String> {
        self.detail.clone()
    }
}

/// A frame buffer whose luma plane starts with `seed`
pub(crate) fn frame_data(resolution: Resolution, seed: u8) -> Vec<u8> {
    let mut data = vec![128u8; resolution.frame_len()];
    for (i, byte) in data[..resolution.luma_len()].iter_mut().enumerate() {
        *byte = seed.wrapping_add(i as u8);
    }
    data
}
