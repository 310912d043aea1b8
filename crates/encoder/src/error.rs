//! Encoder error types

use container::ContainerError;
use frame_source::FrameError;
use thiserror::Error;

/// Status code reported by an encoder backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecStatus {
    #[error("Unspecified internal error")]
    Error,

    #[error("Memory allocation error")]
    MemError,

    #[error("ABI version mismatch")]
    AbiMismatch,

    #[error("Codec does not implement requested capability")]
    Incapable,

    #[error("Encoded bitstream uses an unsupported feature")]
    Unsupported,

    #[error("Invalid parameter")]
    InvalidParam,
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Invalid resolution: {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Failed to get config: {status}")]
    ConfigFailed { status: CodecStatus },

    #[error("Failed to initialize encoder: {status}")]
    InitFailed {
        status: CodecStatus,
        detail: Option<String>,
    },

    #[error("Failed to encode frame: {status}")]
    EncodeFailed {
        status: CodecStatus,
        detail: Option<String>,
    },

    #[error("Failed to destroy codec: {status}")]
    DestroyFailed {
        status: CodecStatus,
        detail: Option<String>,
    },

    #[error("Frame is {width}x{height}, session expects {expected_width}x{expected_height}")]
    FrameResolution {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Session is not ready for {operation}: already finalized")]
    NotReady { operation: &'static str },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl EncoderError {
    /// Backend status for capability-level failures
    pub fn status(&self) -> Option<CodecStatus> {
        match self {
            EncoderError::ConfigFailed { status }
            | EncoderError::InitFailed { status, .. }
            | EncoderError::EncodeFailed { status, .. }
            | EncoderError::DestroyFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend-supplied detail text, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            EncoderError::InitFailed { detail, .. }
            | EncoderError::EncodeFailed { detail, .. }
            | EncoderError::DestroyFailed { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

pub type EncoderResult<T> = Result<T, EncoderError>;
