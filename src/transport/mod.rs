//! Tandem - Socket Transport
//!
//! Turns "be reachable at port P" or "reach host H:P" into a live,
//! bidirectional byte stream, and turns that stream into discrete frames:
//!
//! - **Establishment**: [`bind_listener`], [`accept_peer`], [`connect_peer`]
//! - **Framing**: [`FrameReader`] / [`FrameWriter`] over any async stream
//! - **Lifecycle**: [`ConnectionRole`], [`ConnectionState`] and their atomic cells
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Synchronization Policy           │
//! ├─────────────────────────────────────────┤
//! │           Session Manager               │
//! ├─────────────────────────────────────────┤
//! │          Socket Transport               │  ← This module
//! │   accept/connect, framing, state        │
//! ├─────────────────────────────────────────┤
//! │              TCP                        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The transport never reconnects on its own; that is left to the caller.

mod connection;
mod error;
mod frame;
mod socket;

pub use connection::*;
pub use error::*;
pub use frame::*;
pub use socket::*;
