//! Protocol and timing constants.
//!
//! Wire values are fixed by the protocol and MUST NOT be changed without
//! bumping [`WIRE_VERSION`].

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Version of the binary encoding, exchanged in the connect hello.
pub const WIRE_VERSION: u16 = 1;

/// Frame header size (kind u32 + payload length u64).
pub const FRAME_HEADER_SIZE: usize = 12;

/// Encoded size of a 3-vector (three f32).
pub const VEC3_SIZE: usize = 12;

/// Encoded size of a player input payload.
pub const PLAYER_INPUT_SIZE: usize = VEC3_SIZE + 1 + 1 + 4;

/// Encoded size of one player state record.
pub const PLAYER_STATE_SIZE: usize = VEC3_SIZE * 2 + 1 + 1;

/// Encoded size of a game state update (two player states).
pub const GAME_STATE_UPDATE_SIZE: usize = PLAYER_STATE_SIZE * 2;

/// Encoded size of one platform state record.
pub const PLATFORM_STATE_SIZE: usize = 4 + 4 + VEC3_SIZE + 4 + 4 + 1 + 4 + 4 + 4 + 1 + 4;

/// Encoded size of a goal event.
pub const GOAL_EVENT_SIZE: usize = 8;

/// Default upper bound on a single payload; larger frames are discarded.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64 * 1024;

// =============================================================================
// CONNECTION
// =============================================================================

/// Default TCP port for hosting and joining.
pub const DEFAULT_PORT: u16 = 12345;

/// How long a client waits for the host before giving up.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(150);

/// Interval between "still waiting" log lines during accept/connect.
pub const DEFAULT_PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Time allowed to flush the outgoing disconnect notice.
pub const DEFAULT_DISCONNECT_LINGER: Duration = Duration::from_millis(250);

// =============================================================================
// SYNCHRONIZATION
// =============================================================================

/// Window over which the client blends the remote player toward its target.
pub const DEFAULT_INTERPOLATION_WINDOW: f32 = 0.1;

/// Planar speed applied to remote input on the host (units/s).
pub const DEFAULT_MOVE_SPEED: f32 = 6.0;

/// Vertical velocity added on a remote jump edge (units/s).
pub const DEFAULT_JUMP_VELOCITY: f32 = 15.0;

/// Player slot of the host's own avatar in goal events.
pub const HOST_PLAYER_ID: i32 = 0;

/// Player slot of the client's avatar in goal events.
pub const CLIENT_PLAYER_ID: i32 = 1;
