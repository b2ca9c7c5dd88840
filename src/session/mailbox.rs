//! Latest-value mailboxes and the one-shot goal channel.
//!
//! Live-state kinds (input, player state, platform state, stage choice) only
//! matter as "what is true now", so each gets a single slot that the receive
//! task overwrites. Goal events are discrete facts and go through a bounded
//! channel instead, so each one is consumed exactly once.

use tokio::sync::mpsc;

use crate::wire::{
    GameStateUpdate, GoalEvent, PlatformStateUpdate, PlayerInputSnapshot, StageSelection,
};

/// Single-slot holder of the newest unread value of one kind.
#[derive(Debug, Clone)]
pub struct Mailbox<T> {
    slot: Option<T>,
    overwritten: u64,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: None,
            overwritten: 0,
        }
    }
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, discarding any unread predecessor.
    ///
    /// Returns `true` if an unread value was replaced.
    pub fn put(&mut self, value: T) -> bool {
        let replaced = self.slot.replace(value).is_some();
        if replaced {
            self.overwritten += 1;
        }
        replaced
    }

    /// Read and clear.
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// Whether an unread value is waiting.
    pub fn has_new(&self) -> bool {
        self.slot.is_some()
    }

    /// Number of unread values discarded so far.
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Drop any unread value.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

/// Every live-state mailbox of a session, guarded together by one mutex.
#[derive(Debug, Default)]
pub struct MailboxSet {
    /// Client input (read by the host).
    pub player_input: Mailbox<PlayerInputSnapshot>,
    /// Authoritative player state (read by the client).
    pub game_state: Mailbox<GameStateUpdate>,
    /// Authoritative platform state (read by the client).
    pub platform_state: Mailbox<PlatformStateUpdate>,
    /// Host's stage choice (read by the client).
    pub stage_selection: Mailbox<StageSelection>,
}

impl MailboxSet {
    /// Empty every slot.
    pub fn clear(&mut self) {
        self.player_input.clear();
        self.game_state.clear();
        self.platform_state.clear();
        self.stage_selection.clear();
    }
}

/// Capacity-1 channel carrying goal events.
///
/// While one event is pending, further events are refused rather than
/// replacing it.
#[derive(Debug)]
pub struct GoalChannel {
    tx: mpsc::Sender<GoalEvent>,
    rx: mpsc::Receiver<GoalEvent>,
}

impl Default for GoalChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    /// Deliver an event. Returns `false` if one is already pending.
    pub fn offer(&self, event: GoalEvent) -> bool {
        self.tx.try_send(event).is_ok()
    }

    /// Consume the pending event, if any.
    pub fn take(&mut self) -> Option<GoalEvent> {
        self.rx.try_recv().ok()
    }

    /// Drop any pending event.
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}
