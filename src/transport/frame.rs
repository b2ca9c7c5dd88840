//! Framed reads and writes over a byte stream.
//!
//! Every read loops until the full header/payload arrived (`read_exact`), and
//! every write loops until all bytes were accepted (`write_all`). A short
//! transfer is never mistaken for a complete one.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::error::{TransportError, TransportResult};
use crate::core::{CodecError, DEFAULT_MAX_PAYLOAD_SIZE, FRAME_HEADER_SIZE};
use crate::wire::{Message, MessageHeader, MessageKind, WirePayload};

/// One header-plus-payload unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload kind.
    pub kind: MessageKind,
    /// Encoded payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Frame a typed payload.
    pub fn from_payload<P: WirePayload>(payload: &P) -> Result<Self, CodecError> {
        Ok(Self {
            kind: P::KIND,
            payload: payload.encode()?,
        })
    }

    /// Frame a tagged message.
    pub fn from_message(message: &Message) -> Result<Self, CodecError> {
        Ok(Self {
            kind: message.kind(),
            payload: message.encode_payload()?,
        })
    }

    /// Decode the payload according to its kind.
    pub fn decode(&self) -> Result<Message, CodecError> {
        Message::decode(self.kind, &self.payload)
    }

    /// Header describing this frame.
    pub fn header(&self) -> MessageHeader {
        MessageHeader::new(self.kind, self.payload.len())
    }

    /// Total wire size.
    pub fn wire_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Encode header and payload into one contiguous buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_size());
        buf.extend_from_slice(&self.header().encode());
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Reads frames from the receive half of a stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_payload_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a reader with the default payload limit.
    pub fn new(inner: R) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Wrap a reader with a custom payload limit.
    pub fn with_max_payload(inner: R, max_payload_size: usize) -> Self {
        Self {
            inner,
            max_payload_size,
        }
    }

    /// Read the next complete frame.
    ///
    /// Oversized frames and frames of unknown kind are drained from the
    /// stream and reported as frame violations; the next call reads the
    /// following frame.
    pub async fn read_frame(&mut self) -> TransportResult<Frame> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        read_exact_or_closed(&mut self.inner, &mut header_buf).await?;
        let header = MessageHeader::decode(&header_buf);

        if header.payload_len > self.max_payload_size as u64 {
            self.skip(header.payload_len).await?;
            return Err(TransportError::PayloadTooLarge {
                declared: header.payload_len,
                max: self.max_payload_size,
            });
        }

        let mut payload = vec![0u8; header.payload_len as usize];
        read_exact_or_closed(&mut self.inner, &mut payload).await?;

        let kind = header
            .kind()
            .map_err(|_| TransportError::UnknownKind(header.kind))?;
        trace!(kind = %kind, len = payload.len(), "frame received");
        Ok(Frame { kind, payload })
    }

    async fn skip(&mut self, len: u64) -> TransportResult<()> {
        let mut limited = (&mut self.inner).take(len);
        let skipped = tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
        if skipped < len {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(())
    }
}

async fn read_exact_or_closed<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> TransportResult<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(TransportError::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}

/// Writes frames to the send half of a stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one frame in full and flush it.
    pub async fn write_frame(&mut self, frame: &Frame) -> TransportResult<()> {
        self.inner.write_all(&frame.encode()).await?;
        self.inner.flush().await?;
        trace!(kind = %frame.kind, len = frame.payload.len(), "frame sent");
        Ok(())
    }

    /// Close the write direction.
    pub async fn shutdown(&mut self) -> TransportResult<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
