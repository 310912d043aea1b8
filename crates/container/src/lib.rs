//! IVF container definitions for ivfcast
//!
//! This crate holds the byte-exact container layout (file header, frame
//! headers) and the stream/packet types shared between the encoder and
//! anything that consumes its output.

mod byte_writer;
mod error;
mod header;
mod packet;
mod reader;
mod stream;
mod writer;

pub use byte_writer::*;
pub use error::*;
pub use header::*;
pub use packet::*;
pub use reader::*;
pub use stream::*;
pub use writer::*;

/// Container signature at offset 0 of every file
pub const MAGIC: [u8; 4] = *b"DKIF";

/// Container format version
pub const VERSION: u16 = 0;

/// Size of the stream-level file header
pub const FILE_HEADER_LEN: usize = 32;

/// Size of the header preceding each compressed frame
pub const FRAME_HEADER_LEN: usize = 12;

/// "VP80"
pub const FOURCC_VP8: u32 = 0x3038_5056;

/// "H264"
pub const FOURCC_H264: u32 = 0x3436_3248;
