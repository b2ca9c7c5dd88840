//! Transport layer error types.
//!
//! Errors split into two families: per-frame protocol violations, after which
//! the offending frame has been drained and the stream is still aligned, and
//! connection-level failures, after which the stream is unusable.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::core::CodecError;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error (socket operations).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the stream.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Declared payload exceeds the receive limit; the frame was discarded.
    #[error("payload of {declared} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Length from the header.
        declared: u64,
        /// Configured maximum.
        max: usize,
    },

    /// Header carried an unknown kind ordinal; the frame was discarded.
    #[error("unknown message kind {0}")]
    UnknownKind(u32),

    /// Payload failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Connect did not complete in time.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Host string could not be resolved to an address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl TransportError {
    /// Check if this error concerns a single frame only.
    ///
    /// The frame has already been consumed from the stream, so the caller
    /// may keep reading.
    pub fn is_frame_violation(&self) -> bool {
        matches!(
            self,
            TransportError::PayloadTooLarge { .. }
                | TransportError::UnknownKind(_)
                | TransportError::Codec(_)
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_violations() {
        assert!(TransportError::UnknownKind(42).is_frame_violation());
        assert!(
            TransportError::PayloadTooLarge {
                declared: 1 << 20,
                max: 1024
            }
            .is_frame_violation()
        );
        assert!(TransportError::Codec(CodecError::TrailingBytes(1)).is_frame_violation());

        assert!(!TransportError::ConnectionClosed.is_frame_violation());
        assert!(!TransportError::Io(io::Error::other("test")).is_frame_violation());
    }
}
