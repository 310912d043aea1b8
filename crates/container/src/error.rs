//! Error types for the container

use thiserror::Error;

/// Container error
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u16),

    #[error("Unexpected header size: {0} (expected 32)")]
    BadHeaderSize(u16),

    #[error("Truncated input: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("Dimension {0} does not fit in a 16-bit header field")]
    DimensionOverflow(u32),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

/// Result type alias for container operations
pub type ContainerResult<T> = Result<T, ContainerError>;
