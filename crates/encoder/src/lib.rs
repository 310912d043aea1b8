//! Video Encoder - encode sessions and IVF output for ivfcast
//!
//! Provides the encode pipeline over swappable backends:
//! - `EncodeBackend` trait for the compression capability
//! - OpenH264 (software, cross-platform)
//! - `EncoderSession` lifecycle, packet classification and fatal diagnostics

mod classify;
mod error;
pub mod failure;
mod openh264_backend;
mod pipeline;
mod session;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::*;
pub use error::*;
pub use openh264_backend::*;
pub use pipeline::*;
pub use session::*;
pub use traits::*;

pub use container::{
    CompressedFrame, EncodedPacket, OwnedFrame, OwnedPacket, PacketKind, PassMode, StreamInfo,
    Timebase,
};
pub use frame_source::{RawFrame, Resolution};
