//! Network error types.

use thiserror::Error;

/// Errors raised while encoding or framing voice chat messages.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// A frame announced a body larger than the allowed maximum.
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// The peer closed the stream mid-frame or before a frame started.
    #[error("connection closed")]
    ConnectionClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
