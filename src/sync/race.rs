//! Race lifecycle and result bookkeeping.

use crate::core::{CLIENT_PLAYER_ID, HOST_PLAYER_ID};
use crate::transport::ConnectionRole;
use crate::wire::GoalEvent;

/// Winner id before anyone has finished.
pub const NO_WINNER: i32 = -1;

/// Progress of the current race.
///
/// Player ids are host-relative: [`HOST_PLAYER_ID`] is the host's avatar and
/// [`CLIENT_PLAYER_ID`] the client's, on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceState {
    /// A stage has been loaded for this race.
    pub started: bool,
    /// A winner has been recorded.
    pub finished: bool,
    /// Id of the first player to reach the goal, or [`NO_WINNER`].
    pub winner_player_id: i32,
    /// Clear time of the winner, in seconds.
    pub winner_time: f32,
    /// Clear time of the other player, once known to the host.
    pub loser_time: Option<f32>,
}

impl Default for RaceState {
    fn default() -> Self {
        Self {
            started: false,
            finished: false,
            winner_player_id: NO_WINNER,
            winner_time: 0.0,
            loser_time: None,
        }
    }
}

/// Race result fields the renderer reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceResultView {
    /// Show the result panel.
    pub visible: bool,
    /// Winner's host-relative id.
    pub winner_player_id: i32,
    /// Winner's clear time, in seconds.
    pub winner_time: f32,
    /// Whether the winner is the player at this end.
    pub local_won: bool,
}

impl RaceState {
    /// Clear results and mark a new race as started.
    pub fn start(&mut self) {
        *self = Self {
            started: true,
            ..Self::default()
        };
    }

    /// Record `event` as the result.
    ///
    /// Returns `false` and changes nothing if a result is already recorded.
    pub fn record(&mut self, event: GoalEvent) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.winner_player_id = event.player_id;
        self.winner_time = event.clear_time;
        true
    }

    /// Record the second finisher's time. Only the first call counts.
    pub fn record_runner_up(&mut self, clear_time: f32) {
        if self.finished && self.loser_time.is_none() {
            self.loser_time = Some(clear_time);
        }
    }

    /// Whether the player at this end (by `role`) won.
    pub fn local_won(&self, role: ConnectionRole) -> bool {
        match role {
            ConnectionRole::Host => self.winner_player_id == HOST_PLAYER_ID,
            ConnectionRole::Client => self.winner_player_id == CLIENT_PLAYER_ID,
            ConnectionRole::Unset => false,
        }
    }

    /// UI mirror of the result, once finished.
    pub fn view(&self, role: ConnectionRole) -> Option<RaceResultView> {
        self.finished.then(|| RaceResultView {
            visible: true,
            winner_player_id: self.winner_player_id,
            winner_time: self.winner_time,
            local_won: self.local_won(role),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_once() {
        let mut race = RaceState::default();
        race.start();
        assert!(race.record(GoalEvent {
            player_id: 0,
            clear_time: 12.34,
        }));
        assert!(!race.record(GoalEvent {
            player_id: 1,
            clear_time: 13.0,
        }));
        assert!(race.finished);
        assert_eq!(race.winner_player_id, 0);
        assert_eq!(race.winner_time, 12.34);
    }

    #[test]
    fn test_view_and_local_won() {
        let mut race = RaceState::default();
        assert_eq!(race.view(ConnectionRole::Client), None);

        race.record(GoalEvent {
            player_id: CLIENT_PLAYER_ID,
            clear_time: 8.0,
        });
        let view = race.view(ConnectionRole::Client).unwrap();
        assert!(view.visible);
        assert!(view.local_won);
        assert!(!race.local_won(ConnectionRole::Host));
    }

    #[test]
    fn test_runner_up_and_restart() {
        let mut race = RaceState::default();
        race.record_runner_up(3.0);
        assert_eq!(race.loser_time, None);

        race.record(GoalEvent {
            player_id: 0,
            clear_time: 10.0,
        });
        race.record_runner_up(11.0);
        race.record_runner_up(12.0);
        assert_eq!(race.loser_time, Some(11.0));

        race.start();
        assert!(race.started);
        assert!(!race.finished);
        assert_eq!(race.winner_player_id, NO_WINNER);
    }
}
