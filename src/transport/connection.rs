//! Connection role and lifecycle state.
//!
//! Both are shared between the game-loop thread and the background tasks,
//! so they live in atomics rather than behind the mailbox mutex.

use std::sync::atomic::{AtomicU8, Ordering};

/// Which side of the session this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ConnectionRole {
    /// Neither `start_host` nor `connect_to_host` has been called.
    #[default]
    Unset = 0,
    /// Authoritative side; simulates both players.
    Host = 1,
    /// Mirroring side; submits input only.
    Client = 2,
}

impl ConnectionRole {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionRole::Host,
            2 => ConnectionRole::Client,
            _ => ConnectionRole::Unset,
        }
    }
}

impl std::fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConnectionRole::Unset => "unset",
            ConnectionRole::Host => "host",
            ConnectionRole::Client => "client",
        })
    }
}

/// Connection lifecycle state.
///
/// ```text
/// Host:   Disconnected -> Listening  -> Connected -> Disconnected
/// Client: Disconnected -> Connecting -> Connected -> Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// No socket, or the last one was closed.
    #[default]
    Disconnected = 0,
    /// Host waiting for its single peer.
    Listening = 1,
    /// Client connect in flight.
    Connecting = 2,
    /// Stream established; frames flow both ways.
    Connected = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Listening,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Listening or connecting.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ConnectionState::Listening | ConnectionState::Connecting
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Listening => "listening",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}

/// Atomic cell holding a [`ConnectionRole`].
#[derive(Debug, Default)]
pub struct RoleCell(AtomicU8);

impl RoleCell {
    /// Current role.
    pub fn load(&self) -> ConnectionRole {
        ConnectionRole::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Replace the role.
    pub fn store(&self, role: ConnectionRole) {
        self.0.store(role as u8, Ordering::Release);
    }
}

/// Atomic cell holding a [`ConnectionState`].
///
/// Transitions that must fire a notification go through
/// [`StateCell::transition`] so exactly one thread observes them.
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Current state.
    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Overwrite the state unconditionally, returning the previous one.
    pub fn swap(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.0.swap(state as u8, Ordering::AcqRel))
    }

    /// Move `from -> to` only if the current state is `from`.
    ///
    /// Returns `true` for the single caller that performed the transition.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_cell() {
        let cell = RoleCell::default();
        assert_eq!(cell.load(), ConnectionRole::Unset);
        cell.store(ConnectionRole::Host);
        assert_eq!(cell.load(), ConnectionRole::Host);
        cell.store(ConnectionRole::Client);
        assert_eq!(cell.load(), ConnectionRole::Client);
    }

    #[test]
    fn test_state_transition_is_exclusive() {
        use ConnectionState::{Connected, Disconnected, Listening};

        let cell = StateCell::default();
        assert_eq!(cell.load(), Disconnected);

        assert!(cell.transition(Disconnected, Listening));
        assert!(cell.load().is_pending());
        assert!(cell.transition(Listening, Connected));

        assert!(cell.transition(Connected, Disconnected));
        assert!(!cell.transition(Connected, Disconnected));
    }

    #[test]
    fn test_swap_returns_previous() {
        let cell = StateCell::default();
        cell.swap(ConnectionState::Connecting);
        assert_eq!(
            cell.swap(ConnectionState::Disconnected),
            ConnectionState::Connecting
        );
    }
}
