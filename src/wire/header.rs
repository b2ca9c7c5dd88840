//! Frame header and message kinds.

use crate::core::{CodecError, FRAME_HEADER_SIZE};

/// Discriminant carried in every frame header.
///
/// Ordinals are part of the wire format. New kinds are appended, never
/// inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Client hello carrying its wire version.
    ConnectRequest = 0,
    /// Host answer to the hello.
    ConnectResponse = 1,
    /// Client input for the current tick.
    PlayerInput = 2,
    /// Authoritative state of both players (host only).
    GameStateUpdate = 3,
    /// Authoritative state of every dynamic platform (host only).
    PlatformStateUpdate = 4,
    /// One-shot race result.
    GoalReached = 5,
    /// Orderly shutdown notice.
    Disconnect = 6,
    /// Stage chosen by the host.
    StageSelect = 7,
}

impl MessageKind {
    /// All kinds in ordinal order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::ConnectRequest,
        MessageKind::ConnectResponse,
        MessageKind::PlayerInput,
        MessageKind::GameStateUpdate,
        MessageKind::PlatformStateUpdate,
        MessageKind::GoalReached,
        MessageKind::Disconnect,
        MessageKind::StageSelect,
    ];

    /// Wire ordinal.
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::ConnectRequest => "connect_request",
            MessageKind::ConnectResponse => "connect_response",
            MessageKind::PlayerInput => "player_input",
            MessageKind::GameStateUpdate => "game_state_update",
            MessageKind::PlatformStateUpdate => "platform_state_update",
            MessageKind::GoalReached => "goal_reached",
            MessageKind::Disconnect => "disconnect",
            MessageKind::StageSelect => "stage_select",
        }
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = CodecError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(CodecError::UnknownKind(value))
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Header preceding every payload.
///
/// Wire format:
/// ```text
/// +0   Kind        (4 bytes LE32)
/// +4   Payload Len (8 bytes LE64)
/// ```
///
/// The kind is kept as a raw ordinal so that a frame of an unknown kind can
/// still be skipped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Raw [`MessageKind`] ordinal.
    pub kind: u32,
    /// Number of payload bytes that follow.
    pub payload_len: u64,
}

impl MessageHeader {
    /// Header for a payload of `payload_len` bytes.
    pub fn new(kind: MessageKind, payload_len: usize) -> Self {
        Self {
            kind: kind.ordinal(),
            payload_len: payload_len as u64,
        }
    }

    /// Resolve the kind ordinal.
    pub fn kind(&self) -> Result<MessageKind, CodecError> {
        MessageKind::try_from(self.kind)
    }

    /// Encode to the fixed 12-byte layout.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.kind.to_le_bytes());
        buf[4..12].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Decode from the fixed 12-byte layout. Never fails; the kind is
    /// validated separately via [`MessageHeader::kind`].
    pub fn decode(buf: &[u8; FRAME_HEADER_SIZE]) -> Self {
        let mut kind = [0u8; 4];
        let mut len = [0u8; 8];
        kind.copy_from_slice(&buf[0..4]);
        len.copy_from_slice(&buf[4..12]);
        Self {
            kind: u32::from_le_bytes(kind),
            payload_len: u64::from_le_bytes(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_stable() {
        assert_eq!(MessageKind::ConnectRequest.ordinal(), 0);
        assert_eq!(MessageKind::PlayerInput.ordinal(), 2);
        assert_eq!(MessageKind::GoalReached.ordinal(), 5);
        assert_eq!(MessageKind::Disconnect.ordinal(), 6);
        assert_eq!(MessageKind::StageSelect.ordinal(), 7);
        for (i, kind) in MessageKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal() as usize, i);
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            MessageKind::try_from(99),
            Err(CodecError::UnknownKind(99))
        );
    }

    #[test]
    fn test_header_layout() {
        let header = MessageHeader::new(MessageKind::GoalReached, 8);
        let bytes = header.encode();
        assert_eq!(&bytes[0..4], &[5, 0, 0, 0]);
        assert_eq!(&bytes[4..12], &[8, 0, 0, 0, 0, 0, 0, 0]);

        let decoded = MessageHeader::decode(&bytes);
        assert_eq!(decoded, header);
        assert_eq!(decoded.kind(), Ok(MessageKind::GoalReached));
    }

    #[test]
    fn test_header_keeps_unknown_ordinal() {
        let mut bytes = MessageHeader::new(MessageKind::PlayerInput, 3).encode();
        bytes[0] = 200;
        let header = MessageHeader::decode(&bytes);
        assert_eq!(header.kind, 200);
        assert_eq!(header.payload_len, 3);
        assert!(header.kind().is_err());
    }
}
