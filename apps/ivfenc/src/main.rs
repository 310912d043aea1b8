//! ivfenc - encode raw I420 frames into an IVF container
//!
//! Usage: `ivfenc <WIDTH> <HEIGHT> <INFILE> <OUTFILE>`

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use encoder::failure::{die, die_codec};
use encoder::{
    encode_stream, EncoderError, EncoderSession, OpenH264Backend, PassMode, SessionOptions,
    Timebase,
};
use frame_source::YuvReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pass {
    One,
    First,
    Last,
}

impl From<Pass> for PassMode {
    fn from(pass: Pass) -> Self {
        match pass {
            Pass::One => PassMode::OnePass,
            Pass::First => PassMode::FirstPass,
            Pass::Last => PassMode::LastPass,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ivfenc", version, about = "Encode raw I420 frames into an IVF container")]
struct Args {
    /// Frame width in pixels (even, at least 16)
    width: u32,
    /// Frame height in pixels (even, at least 16)
    height: u32,
    /// Raw planar YUV 4:2:0 input
    input: PathBuf,
    /// IVF output
    output: PathBuf,

    /// Frames per second
    #[arg(long, env = "IVFENC_FPS", default_value_t = 30)]
    fps: u32,

    /// Force a keyframe every N frames
    #[arg(long, env = "IVFENC_KEYFRAME_INTERVAL")]
    keyframe_interval: Option<u32>,

    /// Encoding pass
    #[arg(long, value_enum, default_value_t = Pass::One)]
    pass: Pass,

    /// Stop after this many frames
    #[arg(long, env = "IVFENC_LIMIT")]
    limit: Option<u64>,
}

fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("ivfenc=info".parse()?)
        .add_directive("encoder=warn".parse()?)
        .add_directive("frame_source=warn".parse()?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter()?)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.fps == 0 {
        die("Frame rate must be positive");
    }

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open {} for reading", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("Failed to open {} for writing", args.output.display()))?;

    let options = SessionOptions {
        timebase: Some(Timebase::per_frame(args.fps)),
        pass: Some(args.pass.into()),
        keyframe_interval: args.keyframe_interval.map(Some),
    };

    let mut session =
        match EncoderSession::setup_with(OpenH264Backend::new(), args.width, args.height, options) {
            Ok(session) => session,
            Err(err @ EncoderError::InvalidResolution { .. }) => die(&err.to_string()),
            Err(err) => die_codec(&err),
        };

    let mut source = YuvReader::new(BufReader::new(input), session.resolution());

    let (_, report) = match encode_stream(
        &mut source,
        &mut session,
        BufWriter::new(output),
        args.limit,
    ) {
        Ok(result) => result,
        Err(err) => die_codec(&err),
    };

    let count = match session.finalize() {
        Ok(count) => count,
        Err(err) => die_codec(&err),
    };

    info!(
        "{} -> {}: {} frames written, {} keyframes",
        args.input.display(),
        args.output.display(),
        report.frames_written,
        report.keyframes
    );
    println!("Processed {} frames.", count.submitted);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_warnings_pass_the_default_filter() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("frame_source=warn"), "{filter}");
        assert!(filter.contains("encoder=warn"), "{filter}");
        assert!(filter.contains("ivfenc=info"), "{filter}");
    }

    #[test]
    fn test_parses_positional_arguments() {
        let argv = ["ivfenc", "64", "48", "in.yuv", "out.ivf", "--pass", "first"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!((args.width, args.height), (64, 48));
        assert_eq!(PassMode::from(args.pass), PassMode::FirstPass);
        assert_eq!(args.output, PathBuf::from("out.ivf"));
    }
}
