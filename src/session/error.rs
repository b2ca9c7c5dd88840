//! Session error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::core::CodecError;
use crate::transport::ConnectionRole;

/// Errors surfaced by [`Session`](super::Session) calls.
///
/// Only setup failures and misuse are reported here. Connection loss is
/// signalled through the connection callback and `is_connected`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The background runtime could not be created.
    #[error("failed to start network runtime: {0}")]
    Runtime(#[source] io::Error),

    /// Binding or listening on the host port failed.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Host string is not usable.
    #[error("invalid host address: {0:?}")]
    InvalidAddress(String),

    /// No live connection.
    #[error("not connected")]
    NotConnected,

    /// Operation requires a different role.
    #[error("operation requires the {required} role")]
    WrongRole {
        /// Role the operation needs.
        required: ConnectionRole,
    },

    /// Writer task is gone; the connection is closing.
    #[error("send queue closed")]
    SendQueueClosed,

    /// Payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),
}
