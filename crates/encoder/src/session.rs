//! Encoder session lifecycle

use container::{EncodedPacket, OwnedPacket, PassMode, StreamInfo, Timebase};
use frame_source::{RawFrame, Resolution};
use tracing::{debug, info, trace, warn};

use crate::{
    classify, CodecStatus, Deadline, EncodeBackend, EncodeFlags, EncoderConfig, EncoderError,
    EncoderResult,
};

/// Overrides applied on top of the backend's default configuration
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub timebase: Option<Timebase>,
    pub pass: Option<PassMode>,
    /// `Some(None)` disables periodic keyframes
    pub keyframe_interval: Option<Option<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Ready,
    Finalized,
}

/// Output counters for a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Packets handed out, of any kind
    pub packets: u64,
    /// Compressed frame packets
    pub compressed_frames: u64,
    /// Compressed frames flagged as keyframes
    pub keyframes: u64,
    /// Packets of any other kind
    pub other_packets: u64,
    /// Compressed payload bytes
    pub bytes_output: u64,
    /// Packets drained without being read
    pub discarded: u64,
}

impl SessionStats {
    fn record(&mut self, packet: &EncodedPacket<'_>) {
        self.packets += 1;
        match packet {
            EncodedPacket::Frame(frame) => {
                self.compressed_frames += 1;
                self.bytes_output += frame.data.len() as u64;
                if frame.keyframe {
                    self.keyframes += 1;
                }
            }
            EncodedPacket::Other(_) => self.other_packets += 1,
        }
    }
}

/// Counts reported when a session is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCount {
    /// Raw frames passed to `encode_frame`
    pub submitted: u64,
    /// Flush calls made after the last frame
    pub flushes: u64,
    /// Compressed frame packets handed out
    pub compressed: u64,
}

/// A live encoder context plus its frame counter
pub struct EncoderSession<B: EncodeBackend> {
    backend: B,
    config: EncoderConfig,
    resolution: Resolution,
    state: SessionState,
    frames_submitted: u64,
    flush_calls: u64,
    force_keyframe: bool,
    stats: SessionStats,
}

impl<B: EncodeBackend> EncoderSession<B> {
    /// Validate the resolution and initialize `backend` with its default
    /// configuration, scaled to `width` x `height`
    pub fn setup(backend: B, width: u32, height: u32) -> EncoderResult<Self> {
        Self::setup_with(backend, width, height, SessionOptions::default())
    }

    pub fn setup_with(
        mut backend: B,
        width: u32,
        height: u32,
        options: SessionOptions,
    ) -> EncoderResult<Self> {
        let resolution = Resolution::new(width, height)
            .map_err(|_| EncoderError::InvalidResolution { width, height })?;

        info!("Using {}", backend.name());

        let defaults = backend
            .default_config()
            .map_err(|status| EncoderError::ConfigFailed { status })?;
        let config = scaled_config(&defaults, resolution, &options)?;

        info!(
            "Initializing encoder: {}x{} @ {} kbps, timebase {}/{}, {:?}",
            config.width,
            config.height,
            config.target_bitrate_kbps,
            config.timebase.num,
            config.timebase.den,
            config.pass
        );

        backend
            .initialize(&config)
            .map_err(|status| EncoderError::InitFailed {
                status,
                detail: backend.error_detail(),
            })?;

        Ok(Self {
            backend,
            config,
            resolution,
            state: SessionState::Ready,
            frames_submitted: 0,
            flush_calls: 0,
            force_keyframe: false,
            stats: SessionStats::default(),
        })
    }

    fn ensure_ready(&self, operation: &'static str) -> EncoderResult<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Finalized => Err(EncoderError::NotReady { operation }),
        }
    }

    fn next_flags(&mut self, pts: i64) -> EncodeFlags {
        let periodic = self
            .config
            .keyframe_interval
            .is_some_and(|interval| interval > 0 && pts % interval as i64 == 0);

        let flags = EncodeFlags {
            force_keyframe: self.force_keyframe || periodic,
        };
        if self.force_keyframe {
            self.force_keyframe = false;
            debug!("Forcing keyframe at pts {}", pts);
        }
        flags
    }

    /// Submit one raw frame and return the packets the encoder produced
    /// for it. The encoder may hold frames back, so the sequence can be
    /// empty or carry packets from earlier frames.
    pub fn encode_frame(&mut self, raw: &RawFrame<'_>) -> EncoderResult<Packets<'_, B>> {
        self.ensure_ready("encode_frame")?;

        let actual = raw.resolution();
        if actual != self.resolution {
            return Err(EncoderError::FrameResolution {
                width: actual.width(),
                height: actual.height(),
                expected_width: self.resolution.width(),
                expected_height: self.resolution.height(),
            });
        }

        let pts = self.frames_submitted as i64;
        let flags = self.next_flags(pts);

        self.backend
            .encode(Some(raw), pts, 1, flags, Deadline::Realtime)
            .map_err(|status| self.encode_error(status))?;

        self.frames_submitted += 1;
        Ok(Packets::new(self))
    }

    /// Ask the encoder to release buffered frames without submitting a new
    /// one. Call repeatedly until it yields no packets.
    pub fn flush(&mut self) -> EncoderResult<Packets<'_, B>> {
        self.ensure_ready("flush")?;

        let pts = self.frames_submitted as i64;
        self.backend
            .encode(None, pts, 1, EncodeFlags::default(), Deadline::Realtime)
            .map_err(|status| self.encode_error(status))?;

        self.flush_calls += 1;
        Ok(Packets::new(self))
    }

    fn encode_error(&self, status: CodecStatus) -> EncoderError {
        EncoderError::EncodeFailed {
            status,
            detail: self.backend.error_detail(),
        }
    }

    /// Make the next submitted frame a keyframe
    pub fn force_keyframe(&mut self) {
        self.force_keyframe = true;
    }

    /// Destroy the encoder context. Only the first call succeeds.
    pub fn finalize(&mut self) -> EncoderResult<FrameCount> {
        self.ensure_ready("finalize")?;
        self.state = SessionState::Finalized;

        info!("Processed {} frames.", self.frames_submitted);

        self.backend
            .destroy()
            .map_err(|status| EncoderError::DestroyFailed {
                status,
                detail: self.backend.error_detail(),
            })?;

        Ok(FrameCount {
            submitted: self.frames_submitted,
            flushes: self.flush_calls,
            compressed: self.stats.compressed_frames,
        })
    }

    pub fn is_finalized(&self) -> bool {
        self.state == SessionState::Finalized
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn flush_calls(&self) -> u64 {
        self.flush_calls
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Stream parameters for the container header
    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            fourcc: self.backend.fourcc(),
            width: self.config.width,
            height: self.config.height,
            timebase: self.config.timebase,
            pass: self.config.pass,
        }
    }
}

impl<B: EncodeBackend> Drop for EncoderSession<B> {
    fn drop(&mut self) {
        if self.state == SessionState::Ready {
            self.state = SessionState::Finalized;
            if let Err(status) = self.backend.destroy() {
                warn!("Failed to destroy codec on drop: {}", status);
            }
        }
    }
}

/// Derive the session configuration from the backend defaults.
///
/// The target bitrate scales with pixel count relative to the default
/// resolution.
fn scaled_config(
    defaults: &EncoderConfig,
    resolution: Resolution,
    options: &SessionOptions,
) -> EncoderResult<EncoderConfig> {
    if defaults.width == 0 || defaults.height == 0 {
        return Err(EncoderError::ConfigFailed {
            status: CodecStatus::InvalidParam,
        });
    }

    let bitrate = resolution.pixels() * defaults.target_bitrate_kbps as u64
        / defaults.width as u64
        / defaults.height as u64;

    let mut config = defaults.clone();
    config.target_bitrate_kbps = u32::try_from(bitrate).unwrap_or(u32::MAX);
    config.width = resolution.width();
    config.height = resolution.height();

    if let Some(timebase) = options.timebase {
        config.timebase = timebase;
    }
    if let Some(pass) = options.pass {
        config.pass = pass;
    }
    if let Some(interval) = options.keyframe_interval {
        config.keyframe_interval = interval;
    }

    Ok(config)
}

/// Packets produced by one `encode_frame` or `flush` call.
///
/// Each packet borrows the encoder's buffer until the next call to
/// [`Packets::next_packet`]. Packets left unread are discarded on drop.
pub struct Packets<'s, B: EncodeBackend> {
    session: &'s mut EncoderSession<B>,
    yielded: usize,
}

impl<'s, B: EncodeBackend> Packets<'s, B> {
    fn new(session: &'s mut EncoderSession<B>) -> Self {
        Self {
            session,
            yielded: 0,
        }
    }

    pub fn next_packet(&mut self) -> Option<EncodedPacket<'_>> {
        let session = &mut *self.session;
        let packet = classify(&session.backend.next_packet()?);

        session.stats.record(&packet);
        self.yielded += 1;

        match &packet {
            EncodedPacket::Frame(frame) => trace!(
                "pts {} {} ({} bytes)",
                frame.pts,
                if frame.keyframe { "K" } else { "." },
                frame.data.len()
            ),
            EncodedPacket::Other(kind) => trace!("{:?} packet", kind),
        }

        Some(packet)
    }

    /// Packets handed out so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Drain the remaining packets, copying each payload
    pub fn into_owned(mut self) -> Vec<OwnedPacket> {
        let mut packets = Vec::new();
        while let Some(packet) = self.next_packet() {
            packets.push(packet.to_owned_packet());
        }
        packets
    }
}

impl<B: EncodeBackend> Drop for Packets<'_, B> {
    fn drop(&mut self) {
        let session = &mut *self.session;
        let mut discarded = 0;
        while let Some(packet) = session.backend.next_packet() {
            session.stats.record(&classify(&packet));
            discarded += 1;
        }
        if discarded > 0 {
            session.stats.discarded += discarded;
            debug!("Discarded {} unread packets", discarded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{frame_data, ScriptedBackend};
    use container::PacketKind;

    fn setup(width: u32, height: u32) -> EncoderSession<ScriptedBackend> {
        EncoderSession::setup(ScriptedBackend::new(), width, height).unwrap()
    }

    #[test]
    fn test_bitrate_scales_with_pixels() {
        for (w, h, expected) in [(320, 240, 256), (640, 480, 1024), (160, 120, 64), (16, 16, 0)] {
            let session = setup(w, h);
            assert_eq!(session.config().target_bitrate_kbps, expected, "{w}x{h}");
            assert_eq!(session.config().width, w);
            assert_eq!(session.config().height, h);
        }

        let session = setup(1280, 720);
        assert_eq!(session.config().target_bitrate_kbps, 1280 * 720 * 256 / 320 / 240);
    }

    #[test]
    fn test_invalid_resolution_skips_init() {
        for (w, h) in [(15, 16), (16, 0), (17, 32), (32, 31)] {
            let backend = ScriptedBackend::new();
            let log = backend.log();
            let result = EncoderSession::setup(backend, w, h);
            assert!(matches!(
                result,
                Err(EncoderError::InvalidResolution { width, height }) if width == w && height == h
            ));
            let log = log.lock();
            assert!(log.initialized.is_none());
            assert_eq!(log.default_config_calls, 0);
        }
    }

    #[test]
    fn test_init_failure_carries_detail() {
        let backend = ScriptedBackend::new().fail_init(CodecStatus::InvalidParam, "bad config");
        match EncoderSession::setup(backend, 32, 32) {
            Err(EncoderError::InitFailed { status, detail }) => {
                assert_eq!(status, CodecStatus::InvalidParam);
                assert_eq!(detail.as_deref(), Some("bad config"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("setup should fail"),
        }
    }

    #[test]
    fn test_counter_ignores_packet_count() {
        let mut session =
            EncoderSession::setup(ScriptedBackend::new().with_lookahead(2), 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        let mut per_call = Vec::new();
        for _ in 0..5 {
            per_call.push(session.encode_frame(&raw).unwrap().into_owned().len());
        }

        assert_eq!(per_call, vec![0, 0, 1, 1, 1]);
        assert_eq!(session.frames_submitted(), 5);

        let flushed = session.flush().unwrap().into_owned();
        assert_eq!(flushed.len(), 2);
        assert_eq!(session.frames_submitted(), 5);
        assert_eq!(session.flush_calls(), 1);
    }

    #[test]
    fn test_submits_realtime_with_frame_index() {
        let backend = ScriptedBackend::new();
        let log = backend.log();
        let mut session = EncoderSession::setup(backend, 16, 16).unwrap();
        let data = frame_data(session.resolution(), 3);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        for _ in 0..3 {
            drop(session.encode_frame(&raw).unwrap());
        }

        let log = log.lock();
        let pts: Vec<i64> = log.encodes.iter().map(|e| e.pts).collect();
        assert_eq!(pts, vec![0, 1, 2]);
        assert!(log.encodes.iter().all(|e| e.deadline == Deadline::Realtime));
        assert!(log.encodes.iter().all(|e| e.had_frame && e.duration == 1));
    }

    #[test]
    fn test_keyframe_interval_and_force() {
        let backend = ScriptedBackend::new();
        let log = backend.log();
        let options = SessionOptions {
            keyframe_interval: Some(Some(3)),
            ..Default::default()
        };
        let mut session = EncoderSession::setup_with(backend, 16, 16, options).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        let mut keys = Vec::new();
        for i in 0..7 {
            if i == 4 {
                session.force_keyframe();
            }
            for packet in session.encode_frame(&raw).unwrap().into_owned() {
                keys.push(packet.as_packet().is_keyframe());
            }
        }

        assert_eq!(keys, vec![true, false, false, true, true, false, true]);
        assert_eq!(session.stats().keyframes, 4);
        let log = log.lock();
        assert_eq!(log.encodes.len(), 7);
        assert!(log.encodes[4].flags.force_keyframe);
        assert!(!log.encodes[5].flags.force_keyframe);
    }

    #[test]
    fn test_other_packets_are_classified() {
        let mut session =
            EncoderSession::setup(ScriptedBackend::new().with_stats_packets(), 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        let mut packets = session.encode_frame(&raw).unwrap();
        assert_eq!(packets.next_packet().unwrap().kind(), PacketKind::TwoPassStats);
        assert_eq!(packets.next_packet().unwrap().kind(), PacketKind::Frame);
        assert!(packets.next_packet().is_none());
        drop(packets);

        assert_eq!(session.stats().other_packets, 1);
        assert_eq!(session.stats().compressed_frames, 1);
    }

    #[test]
    fn test_unread_packets_are_discarded() {
        let mut session =
            EncoderSession::setup(ScriptedBackend::new().with_stats_packets(), 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        drop(session.encode_frame(&raw).unwrap());
        let mut packets = session.encode_frame(&raw).unwrap();
        let first = packets.next_packet().unwrap();
        assert_eq!(first.kind(), PacketKind::TwoPassStats);
        let second = packets.next_packet().unwrap();
        assert_eq!(second.as_frame().unwrap().pts, 1);
        drop(packets);

        let stats = session.stats();
        assert_eq!(stats.discarded, 2);
        assert_eq!(stats.packets, 4);
        assert_eq!(stats.other_packets, 2);
        assert_eq!(stats.compressed_frames, 2);
    }

    #[test]
    fn test_dropped_packets_still_counted() {
        let mut session =
            EncoderSession::setup(ScriptedBackend::new().with_lookahead(1), 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        for _ in 0..3 {
            drop(session.encode_frame(&raw).unwrap());
        }
        drop(session.flush().unwrap());

        assert_eq!(session.stats().discarded, 3);
        assert_eq!(session.stats().keyframes, 1);
        let count = session.finalize().unwrap();
        assert_eq!(count.submitted, 3);
        assert_eq!(count.compressed, 3);
        assert_eq!(count.flushes, 1);
    }

    #[test]
    fn test_encode_failure() {
        let backend = ScriptedBackend::new().fail_encode_at(1, "out of bits");
        let mut session = EncoderSession::setup(backend, 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();

        assert!(session.encode_frame(&raw).is_ok());
        match session.encode_frame(&raw) {
            Err(err) => {
                assert_eq!(err.status(), Some(CodecStatus::Error));
                assert_eq!(err.detail(), Some("out of bits"));
            }
            Ok(_) => panic!("encode should fail"),
        }
        assert_eq!(session.frames_submitted(), 1);
    }

    #[test]
    fn test_rejects_frame_of_other_resolution() {
        let mut session = setup(32, 16);
        let other = Resolution::new(16, 32).unwrap();
        let data = frame_data(other, 0);
        let raw = RawFrame::new(&data, other).unwrap();

        assert!(matches!(
            session.encode_frame(&raw),
            Err(EncoderError::FrameResolution { width: 16, height: 32, .. })
        ));
        assert_eq!(session.frames_submitted(), 0);
    }

    #[test]
    fn test_finalize_once() {
        let backend = ScriptedBackend::new();
        let log = backend.log();
        let mut session = EncoderSession::setup(backend, 16, 16).unwrap();
        let data = frame_data(session.resolution(), 0);
        let raw = RawFrame::new(&data, session.resolution()).unwrap();
        for _ in 0..4 {
            drop(session.encode_frame(&raw).unwrap());
        }

        let count = session.finalize().unwrap();
        assert_eq!(count.submitted, 4);
        assert_eq!(count.compressed, 4);
        assert_eq!(count.flushes, 0);
        assert!(session.is_finalized());

        assert!(matches!(
            session.finalize(),
            Err(EncoderError::NotReady { operation: "finalize" })
        ));
        assert!(matches!(
            session.encode_frame(&raw),
            Err(EncoderError::NotReady { operation: "encode_frame" })
        ));
        assert!(matches!(
            session.flush(),
            Err(EncoderError::NotReady { operation: "flush" })
        ));

        drop(session);
        assert_eq!(log.lock().destroy_calls, 1);
    }

    #[test]
    fn test_destroy_failure_is_reported_once() {
        let backend = ScriptedBackend::new().fail_destroy("context busy");
        let log = backend.log();
        let mut session = EncoderSession::setup(backend, 16, 16).unwrap();

        assert!(matches!(
            session.finalize(),
            Err(EncoderError::DestroyFailed { .. })
        ));
        assert!(matches!(
            session.finalize(),
            Err(EncoderError::NotReady { .. })
        ));
        drop(session);
        assert_eq!(log.lock().destroy_calls, 1);
    }

    #[test]
    fn test_drop_destroys_unfinalized_session() {
        let backend = ScriptedBackend::new();
        let log = backend.log();
        drop(setup_owned(backend));
        assert_eq!(log.lock().destroy_calls, 1);
    }

    fn setup_owned(backend: ScriptedBackend) -> EncoderSession<ScriptedBackend> {
        EncoderSession::setup(backend, 64, 48).unwrap()
    }

    #[test]
    fn test_options_override_defaults() {
        let options = SessionOptions {
            timebase: Some(Timebase::new(1001, 30000)),
            pass: Some(PassMode::FirstPass),
            keyframe_interval: Some(None),
        };
        let session = EncoderSession::setup_with(ScriptedBackend::new(), 320, 240, options).unwrap();

        assert_eq!(session.config().timebase, Timebase::new(1001, 30000));
        assert_eq!(session.config().keyframe_interval, None);
        let info = session.stream_info();
        assert_eq!(info.pass, PassMode::FirstPass);
        assert_eq!(info.fourcc, ScriptedBackend::FOURCC);
    }
}
