//! Payload structures, one per message kind.

use glam::Vec3;

use super::codec::{WireReader, WireWriter};
use super::header::MessageKind;
use crate::core::{
    CodecError, GAME_STATE_UPDATE_SIZE, GOAL_EVENT_SIZE, PLATFORM_STATE_SIZE, PLAYER_INPUT_SIZE,
    PLAYER_STATE_SIZE,
};

/// A fixed-layout payload bound to one [`MessageKind`].
///
/// `decode` MUST consume exactly the bytes `encode` produced; leftover bytes
/// are an error rather than silently ignored.
pub trait WirePayload: Sized {
    /// Kind written into the frame header.
    const KIND: MessageKind;

    /// Append the payload fields to `w`.
    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError>;

    /// Read the payload fields from `r`.
    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError>;

    /// Encode into a fresh buffer.
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = WireWriter::new();
        self.encode_into(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decode a complete payload.
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = WireReader::new(data);
        let value = Self::decode_from(&mut r)?;
        r.finish()?;
        Ok(value)
    }
}

// =============================================================================
// CONNECTION HELLO
// =============================================================================

/// Client hello, sent once right after the TCP connection completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Sender's wire version.
    pub version: u16,
}

impl WirePayload for ConnectRequest {
    const KIND: MessageKind = MessageKind::ConnectRequest;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_u16(self.version);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: r.get_u16()?,
        })
    }
}

/// Host answer to [`ConnectRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectResponse {
    /// Host's wire version.
    pub version: u16,
    /// Whether the host considers the versions compatible.
    pub accepted: bool,
}

impl WirePayload for ConnectResponse {
    const KIND: MessageKind = MessageKind::ConnectResponse;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_u16(self.version);
        w.put_bool(self.accepted);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: r.get_u16()?,
            accepted: r.get_bool()?,
        })
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// One tick of input from the input-submitting side.
///
/// Carries no identity: each send replaces any unconsumed previous one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInputSnapshot {
    /// Unit movement direction, or zero when no key is held.
    pub move_direction: Vec3,
    /// Jump key is down this tick (level).
    pub jump_held: bool,
    /// Jump key went down this tick (edge).
    pub jump_edge: bool,
    /// Sender's frame delta in seconds.
    pub frame_delta: f32,
}

impl WirePayload for PlayerInputSnapshot {
    const KIND: MessageKind = MessageKind::PlayerInput;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_vec3(self.move_direction);
        w.put_bool(self.jump_held);
        w.put_bool(self.jump_edge);
        w.put_f32(self.frame_delta);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        if r.remaining() < PLAYER_INPUT_SIZE {
            return Err(CodecError::TooShort {
                expected: PLAYER_INPUT_SIZE,
                actual: r.remaining(),
            });
        }
        Ok(Self {
            move_direction: r.get_vec3()?,
            jump_held: r.get_bool()?,
            jump_edge: r.get_bool()?,
            frame_delta: r.get_f32()?,
        })
    }
}

/// Authoritative kinematic state of one player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerStateSnapshot {
    /// World position.
    pub position: Vec3,
    /// World velocity.
    pub velocity: Vec3,
    /// Player is moving away from the camera.
    pub facing_backward: bool,
    /// Renderer shows the front texture.
    pub showing_front_face: bool,
}

impl PlayerStateSnapshot {
    fn encode_into(&self, w: &mut WireWriter) {
        w.put_vec3(self.position);
        w.put_vec3(self.velocity);
        w.put_bool(self.facing_backward);
        w.put_bool(self.showing_front_face);
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        if r.remaining() < PLAYER_STATE_SIZE {
            return Err(CodecError::TooShort {
                expected: PLAYER_STATE_SIZE,
                actual: r.remaining(),
            });
        }
        Ok(Self {
            position: r.get_vec3()?,
            velocity: r.get_vec3()?,
            facing_backward: r.get_bool()?,
            showing_front_face: r.get_bool()?,
        })
    }
}

/// Both players' authoritative state, broadcast by the host every tick.
///
/// Fields are named by avatar, not by perspective: `host_player` is the
/// host's own avatar and `client_player` is the avatar the host simulates
/// from client input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GameStateUpdate {
    /// The host's avatar.
    pub host_player: PlayerStateSnapshot,
    /// The client's avatar, as simulated by the host.
    pub client_player: PlayerStateSnapshot,
}

impl WirePayload for GameStateUpdate {
    const KIND: MessageKind = MessageKind::GameStateUpdate;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        self.host_player.encode_into(w);
        self.client_player.encode_into(w);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        if r.remaining() < GAME_STATE_UPDATE_SIZE {
            return Err(CodecError::TooShort {
                expected: GAME_STATE_UPDATE_SIZE,
                actual: r.remaining(),
            });
        }
        Ok(Self {
            host_player: PlayerStateSnapshot::decode_from(r)?,
            client_player: PlayerStateSnapshot::decode_from(r)?,
        })
    }
}

// =============================================================================
// PLATFORMS
// =============================================================================

/// Platform discriminant carried in each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum PlatformKind {
    /// Never moves; synced by position only.
    #[default]
    Static = 0,
    /// Moves along a path once a player boards.
    Moving = 1,
    /// Spins in place.
    Rotating = 2,
    /// Walks a fixed loop of waypoints.
    Patrolling = 3,
    /// Fades in and out on a timer.
    CycleDisappearing = 4,
    /// Any other dynamic platform; synced by position only.
    Other = 5,
}

impl TryFrom<i32> for PlatformKind {
    type Error = CodecError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlatformKind::Static),
            1 => Ok(PlatformKind::Moving),
            2 => Ok(PlatformKind::Rotating),
            3 => Ok(PlatformKind::Patrolling),
            4 => Ok(PlatformKind::CycleDisappearing),
            5 => Ok(PlatformKind::Other),
            other => Err(CodecError::UnknownPlatformKind(other)),
        }
    }
}

/// State of one dynamic platform, addressed by its position in the
/// platform collection.
///
/// Only the scalars relevant to `kind` carry meaning; the rest are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlatformStateSnapshot {
    /// Index into the platform collection; both sides must build it identically.
    pub index: i32,
    /// Platform variant.
    pub kind: PlatformKind,
    /// World position.
    pub position: Vec3,
    /// Rotating: current angle.
    pub rotation_angle: f32,
    /// Moving: time along the path.
    pub move_timer: f32,
    /// Moving: a player is standing on it.
    pub occupied: bool,
    /// Patrolling: current waypoint.
    pub patrol_index: i32,
    /// Patrolling: time toward the next waypoint.
    pub patrol_timer: f32,
    /// CycleDisappearing: time within the cycle.
    pub cycle_timer: f32,
    /// CycleDisappearing: currently solid and drawn.
    pub visible: bool,
    /// CycleDisappearing: blink fade value.
    pub blink_alpha: f32,
}

impl PlatformStateSnapshot {
    /// Snapshot with only identity and position set.
    pub fn new(index: i32, kind: PlatformKind, position: Vec3) -> Self {
        Self {
            index,
            kind,
            position,
            ..Self::default()
        }
    }

    fn encode_into(&self, w: &mut WireWriter) {
        w.put_i32(self.index);
        w.put_i32(self.kind as i32);
        w.put_vec3(self.position);
        w.put_f32(self.rotation_angle);
        w.put_f32(self.move_timer);
        w.put_bool(self.occupied);
        w.put_i32(self.patrol_index);
        w.put_f32(self.patrol_timer);
        w.put_f32(self.cycle_timer);
        w.put_bool(self.visible);
        w.put_f32(self.blink_alpha);
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            index: r.get_i32()?,
            kind: PlatformKind::try_from(r.get_i32()?)?,
            position: r.get_vec3()?,
            rotation_angle: r.get_f32()?,
            move_timer: r.get_f32()?,
            occupied: r.get_bool()?,
            patrol_index: r.get_i32()?,
            patrol_timer: r.get_f32()?,
            cycle_timer: r.get_f32()?,
            visible: r.get_bool()?,
            blink_alpha: r.get_f32()?,
        })
    }
}

/// Every dynamic platform's state for one sync tick.
///
/// Wire format: `count: i32` followed by `count` fixed-size records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlatformStateUpdate {
    /// One snapshot per platform, in collection order.
    pub platforms: Vec<PlatformStateSnapshot>,
}

impl WirePayload for PlatformStateUpdate {
    const KIND: MessageKind = MessageKind::PlatformStateUpdate;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        let count = i32::try_from(self.platforms.len())
            .map_err(|_| CodecError::OutOfRange("platform count"))?;
        w.put_i32(count);
        for platform in &self.platforms {
            platform.encode_into(w);
        }
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let count = r.get_i32()?;
        let n = usize::try_from(count).map_err(|_| CodecError::InvalidCount(count))?;
        let needed = n
            .checked_mul(PLATFORM_STATE_SIZE)
            .ok_or(CodecError::InvalidCount(count))?;
        if r.remaining() < needed {
            return Err(CodecError::TooShort {
                expected: needed,
                actual: r.remaining(),
            });
        }

        let mut platforms = Vec::with_capacity(n);
        for _ in 0..n {
            platforms.push(PlatformStateSnapshot::decode_from(r)?);
        }
        Ok(Self { platforms })
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// One-shot race result.
///
/// `player_id` is relative to the sender: 0 is the sender's own avatar, 1 is
/// its peer's. Only the host sends goals, so 0 always names the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoalEvent {
    /// Winning player slot.
    pub player_id: i32,
    /// Winner's clear time in seconds.
    pub clear_time: f32,
}

impl WirePayload for GoalEvent {
    const KIND: MessageKind = MessageKind::GoalReached;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i32(self.player_id);
        w.put_f32(self.clear_time);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        if r.remaining() < GOAL_EVENT_SIZE {
            return Err(CodecError::TooShort {
                expected: GOAL_EVENT_SIZE,
                actual: r.remaining(),
            });
        }
        Ok(Self {
            player_id: r.get_i32()?,
            clear_time: r.get_f32()?,
        })
    }
}

/// Stage chosen by the host, sent before it loads the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSelection {
    /// Stage number.
    pub stage: i32,
}

impl WirePayload for StageSelection {
    const KIND: MessageKind = MessageKind::StageSelect;

    fn encode_into(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i32(self.stage);
        Ok(())
    }

    fn decode_from(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            stage: r.get_i32()?,
        })
    }
}

/// Orderly shutdown notice; empty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisconnectNotice;

impl WirePayload for DisconnectNotice {
    const KIND: MessageKind = MessageKind::Disconnect;

    fn encode_into(&self, _w: &mut WireWriter) -> Result<(), CodecError> {
        Ok(())
    }

    fn decode_from(_r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self)
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Any decoded payload, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`ConnectRequest`].
    ConnectRequest(ConnectRequest),
    /// See [`ConnectResponse`].
    ConnectResponse(ConnectResponse),
    /// See [`PlayerInputSnapshot`].
    PlayerInput(PlayerInputSnapshot),
    /// See [`GameStateUpdate`].
    GameState(GameStateUpdate),
    /// See [`PlatformStateUpdate`].
    PlatformState(PlatformStateUpdate),
    /// See [`GoalEvent`].
    Goal(GoalEvent),
    /// See [`DisconnectNotice`].
    Disconnect,
    /// See [`StageSelection`].
    StageSelect(StageSelection),
}

impl Message {
    /// Kind this message is framed with.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ConnectRequest(_) => MessageKind::ConnectRequest,
            Message::ConnectResponse(_) => MessageKind::ConnectResponse,
            Message::PlayerInput(_) => MessageKind::PlayerInput,
            Message::GameState(_) => MessageKind::GameStateUpdate,
            Message::PlatformState(_) => MessageKind::PlatformStateUpdate,
            Message::Goal(_) => MessageKind::GoalReached,
            Message::Disconnect => MessageKind::Disconnect,
            Message::StageSelect(_) => MessageKind::StageSelect,
        }
    }

    /// Encode the payload (header not included).
    pub fn encode_payload(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Message::ConnectRequest(m) => m.encode(),
            Message::ConnectResponse(m) => m.encode(),
            Message::PlayerInput(m) => m.encode(),
            Message::GameState(m) => m.encode(),
            Message::PlatformState(m) => m.encode(),
            Message::Goal(m) => m.encode(),
            Message::Disconnect => DisconnectNotice.encode(),
            Message::StageSelect(m) => m.encode(),
        }
    }

    /// Decode a payload of the given kind.
    pub fn decode(kind: MessageKind, payload: &[u8]) -> Result<Self, CodecError> {
        Ok(match kind {
            MessageKind::ConnectRequest => {
                Message::ConnectRequest(ConnectRequest::decode(payload)?)
            }
            MessageKind::ConnectResponse => {
                Message::ConnectResponse(ConnectResponse::decode(payload)?)
            }
            MessageKind::PlayerInput => Message::PlayerInput(PlayerInputSnapshot::decode(payload)?),
            MessageKind::GameStateUpdate => Message::GameState(GameStateUpdate::decode(payload)?),
            MessageKind::PlatformStateUpdate => {
                Message::PlatformState(PlatformStateUpdate::decode(payload)?)
            }
            MessageKind::GoalReached => Message::Goal(GoalEvent::decode(payload)?),
            MessageKind::Disconnect => {
                DisconnectNotice::decode(payload)?;
                Message::Disconnect
            }
            MessageKind::StageSelect => Message::StageSelect(StageSelection::decode(payload)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(seed: f32) -> PlayerStateSnapshot {
        PlayerStateSnapshot {
            position: Vec3::new(seed, seed + 1.0, seed + 2.0),
            velocity: Vec3::new(-seed, 0.5, 0.25),
            facing_backward: true,
            showing_front_face: false,
        }
    }

    fn sample_messages() -> Vec<Message> {
        let mut moving =
            PlatformStateSnapshot::new(1, PlatformKind::Moving, Vec3::new(1.0, 2.0, 3.0));
        moving.move_timer = 2.5;
        moving.occupied = true;
        let mut cycling = PlatformStateSnapshot::new(
            4,
            PlatformKind::CycleDisappearing,
            Vec3::new(0.0, 5.0, 0.0),
        );
        cycling.cycle_timer = 1.75;
        cycling.visible = true;
        cycling.blink_alpha = 0.3;

        vec![
            Message::ConnectRequest(ConnectRequest { version: 1 }),
            Message::ConnectResponse(ConnectResponse {
                version: 1,
                accepted: true,
            }),
            Message::PlayerInput(PlayerInputSnapshot {
                move_direction: Vec3::new(0.6, 0.0, -0.8),
                jump_held: true,
                jump_edge: false,
                frame_delta: 1.0 / 60.0,
            }),
            Message::GameState(GameStateUpdate {
                host_player: player(1.0),
                client_player: player(-7.5),
            }),
            Message::PlatformState(PlatformStateUpdate {
                platforms: vec![moving, cycling],
            }),
            Message::Goal(GoalEvent {
                player_id: 0,
                clear_time: 12.34,
            }),
            Message::Disconnect,
            Message::StageSelect(StageSelection { stage: 3 }),
        ]
    }

    #[test]
    fn test_every_kind_roundtrips() {
        for msg in sample_messages() {
            let payload = msg.encode_payload().unwrap();
            let decoded = Message::decode(msg.kind(), &payload).unwrap();
            assert_eq!(decoded, msg, "kind {}", msg.kind());
        }
    }

    #[test]
    fn test_fixed_sizes() {
        let input = PlayerInputSnapshot::default().encode().unwrap();
        assert_eq!(input.len(), PLAYER_INPUT_SIZE);

        let state = GameStateUpdate::default().encode().unwrap();
        assert_eq!(state.len(), GAME_STATE_UPDATE_SIZE);

        let platforms = PlatformStateUpdate {
            platforms: vec![PlatformStateSnapshot::default(); 3],
        }
        .encode()
        .unwrap();
        assert_eq!(platforms.len(), 4 + 3 * PLATFORM_STATE_SIZE);

        assert!(DisconnectNotice.encode().unwrap().is_empty());
    }

    #[test]
    fn test_truncated_game_state() {
        let mut bytes = GameStateUpdate::default().encode().unwrap();
        bytes.truncate(GAME_STATE_UPDATE_SIZE - 1);
        assert!(matches!(
            GameStateUpdate::decode(&bytes),
            Err(CodecError::TooShort { .. })
        ));
    }

    #[test]
    fn test_platform_count_mismatch() {
        let mut bytes = PlatformStateUpdate {
            platforms: vec![PlatformStateSnapshot::default()],
        }
        .encode()
        .unwrap();
        bytes[0] = 2;
        assert!(matches!(
            PlatformStateUpdate::decode(&bytes),
            Err(CodecError::TooShort { .. })
        ));

        bytes[0..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(
            PlatformStateUpdate::decode(&bytes),
            Err(CodecError::InvalidCount(-1))
        );
    }

    #[test]
    fn test_unknown_platform_kind() {
        let mut bytes = PlatformStateUpdate {
            platforms: vec![PlatformStateSnapshot::default()],
        }
        .encode()
        .unwrap();
        // count (4) + index (4), then kind
        bytes[8..12].copy_from_slice(&9i32.to_le_bytes());
        assert_eq!(
            PlatformStateUpdate::decode(&bytes),
            Err(CodecError::UnknownPlatformKind(9))
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = GoalEvent::default().encode().unwrap();
        bytes.push(0);
        assert_eq!(GoalEvent::decode(&bytes), Err(CodecError::TrailingBytes(1)));

        assert_eq!(
            Message::decode(MessageKind::Disconnect, &[1]),
            Err(CodecError::TrailingBytes(1))
        );
    }
}
