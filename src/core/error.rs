//! Error types shared across layers.

use thiserror::Error;

/// Errors that can occur when encoding or decoding a payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input data is shorter than the layout requires.
    #[error("payload too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum bytes required.
        expected: usize,
        /// Actual bytes available.
        actual: usize,
    },

    /// Message kind ordinal not known to this version.
    #[error("unknown message kind: {0}")]
    UnknownKind(u32),

    /// Platform kind discriminant not known to this version.
    #[error("unknown platform kind: {0}")]
    UnknownPlatformKind(i32),

    /// Negative or oversized record count.
    #[error("invalid record count: {0}")]
    InvalidCount(i32),

    /// Payload carried bytes past the end of the layout.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// Value does not fit the wire field.
    #[error("value out of range for wire field: {0}")]
    OutOfRange(&'static str),
}
