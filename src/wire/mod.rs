//! Tandem - Wire Codec
//!
//! Pure data contracts for everything that crosses the socket:
//!
//! - **Frame header**: [`MessageHeader`] (kind ordinal + payload length)
//! - **Payloads**: one fixed-layout struct per [`MessageKind`]
//! - **Codec**: explicit little-endian, field-by-field encoding via
//!   [`WireWriter`]/[`WireReader`], decoupled from in-memory layout
//!
//! ```text
//! Frame   := Header Payload?
//! Header  := kind: u32 LE | payload_len: u64 LE
//! Payload := exactly payload_len bytes, layout chosen by kind
//! ```

mod codec;
mod header;
mod payload;

pub use codec::*;
pub use header::*;
pub use payload::*;
