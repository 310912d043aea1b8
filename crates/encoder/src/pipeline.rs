//! Frame source to container pipeline

use std::io::{Seek, Write};

use container::{EncodedPacket, IvfWriter};
use frame_source::{FrameSource, ReadOutcome};
use tracing::{debug, info, warn};

use crate::{EncodeBackend, EncoderError, EncoderResult, EncoderSession};

/// What a pipeline run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Complete raw frames read and submitted
    pub frames_read: u64,
    /// Frame records written to the container
    pub frames_written: u32,
    /// Keyframes among the written records
    pub keyframes: u64,
    /// Packets that were not compressed frames
    pub skipped_packets: u64,
    /// The source ended partway through a frame
    pub partial_read: bool,
}

fn write_packet<W: Write + Seek>(
    writer: &mut IvfWriter<W>,
    packet: &EncodedPacket<'_>,
    report: &mut PipelineReport,
) -> EncoderResult<()> {
    if writer.write_packet(packet)? {
        if packet.is_keyframe() {
            report.keyframes += 1;
        }
    } else {
        warn!(
            "Got a different kind of packet ({:?}), don't know how to handle",
            packet.kind()
        );
        report.skipped_packets += 1;
    }
    Ok(())
}

/// Encode every frame `source` produces into a container written to `sink`.
///
/// Reading stops at the end of input, at a partial frame, or after `limit`
/// frames. The encoder is then flushed until it has nothing left and the
/// container header is patched with the final frame count. The session is
/// left ready so the caller decides when to finalize it.
pub fn encode_stream<S, B, W>(
    source: &mut S,
    session: &mut EncoderSession<B>,
    sink: W,
    limit: Option<u64>,
) -> EncoderResult<(W, PipelineReport)>
where
    S: FrameSource,
    B: EncodeBackend,
    W: Write + Seek,
{
    let expected = session.resolution();
    let actual = source.resolution();
    if actual != expected {
        return Err(EncoderError::FrameResolution {
            width: actual.width(),
            height: actual.height(),
            expected_width: expected.width(),
            expected_height: expected.height(),
        });
    }

    let mut writer = IvfWriter::create(sink, session.stream_info())?;
    let mut report = PipelineReport::default();

    loop {
        if limit.is_some_and(|limit| report.frames_read >= limit) {
            debug!("Frame limit {} reached", report.frames_read);
            break;
        }

        let raw = match source.next_frame()? {
            ReadOutcome::Frame(raw) => raw,
            ReadOutcome::Partial { .. } => {
                report.partial_read = true;
                break;
            }
            ReadOutcome::End => break,
        };

        report.frames_read += 1;
        let mut packets = session.encode_frame(&raw)?;
        while let Some(packet) = packets.next_packet() {
            write_packet(&mut writer, &packet, &mut report)?;
        }
    }

    loop {
        let mut packets = session.flush()?;
        let mut got_data = false;
        while let Some(packet) = packets.next_packet() {
            got_data = true;
            write_packet(&mut writer, &packet, &mut report)?;
        }
        if !got_data {
            break;
        }
    }

    let (sink, frames_written) = writer.finish()?;
    report.frames_written = frames_written;

    info!(
        "Wrote {} frames ({} keyframes) from {} input frames",
        report.frames_written, report.keyframes, report.frames_read
    );
    Ok((sink, report))
}
