//! Frame source error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid resolution: {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type FrameResult<T> = Result<T, FrameError>;
