//! Raw frame input for ivfcast
//!
//! Provides the planar YUV 4:2:0 frame view consumed by the encoder and
//! sources that produce those frames:
//! - `YuvReader` for raw `.yuv` files or any other byte stream

mod error;
mod frame;
mod traits;
mod yuv_reader;

pub use error::*;
pub use frame::*;
pub use traits::*;
pub use yuv_reader::*;
