//! The game-side collaborator the policy reads from and writes to.

use crate::wire::{PlayerInputSnapshot, PlayerStateSnapshot};

use super::config::SyncConfig;
use super::input::{MovementKeys, ViewMode};
use super::platform::Platform;
use super::race::RaceResultView;

/// Hooks into the game simulation.
///
/// "Local" is the avatar controlled at this end and "remote" the mirror of
/// the peer's avatar. Physics, collision, and stage content stay on the
/// implementor's side.
pub trait Simulation {
    /// State of the avatar controlled at this end.
    fn local_player(&self) -> PlayerStateSnapshot;

    /// Overwrite the local avatar (client: host-authoritative state).
    fn set_local_player(&mut self, state: PlayerStateSnapshot);

    /// State of the peer's avatar.
    fn remote_player(&self) -> PlayerStateSnapshot;

    /// Overwrite the peer's avatar.
    fn set_remote_player(&mut self, state: PlayerStateSnapshot);

    /// Movement keys held this tick.
    fn movement_keys(&self) -> MovementKeys;

    /// Camera currently in use.
    fn view_mode(&self) -> ViewMode;

    /// Platform collection, in construction order.
    fn platforms(&self) -> &[Platform];

    /// Mutable platform collection.
    fn platforms_mut(&mut self) -> &mut [Platform];

    /// Clear time if the local avatar has reached the goal.
    fn local_goal_time(&self) -> Option<f32>;

    /// Clear time if the peer's avatar has reached the goal.
    fn remote_goal_time(&self) -> Option<f32>;

    /// Load stage `stage`, rebuilding the platform collection.
    fn load_stage(&mut self, stage: i32);

    /// Reset camera and UI after a stage change.
    fn reset_view(&mut self) {}

    /// Show the race result.
    fn show_race_result(&mut self, view: RaceResultView);

    /// Host side: drive the peer's avatar from its input.
    ///
    /// The default moves it at `move_speed` in the input's planar direction
    /// and adds `jump_velocity` on a jump edge.
    fn apply_remote_input(&mut self, input: &PlayerInputSnapshot, dt: f32, config: &SyncConfig) {
        let mut remote = self.remote_player();
        integrate_remote_input(&mut remote, input, dt, config);
        self.set_remote_player(remote);
    }
}

/// Kinematic step used by the default [`Simulation::apply_remote_input`].
pub fn integrate_remote_input(
    state: &mut PlayerStateSnapshot,
    input: &PlayerInputSnapshot,
    dt: f32,
    config: &SyncConfig,
) {
    let dir = input.move_direction.normalize_or_zero();
    let distance = config.move_speed * dt;
    state.position.x += dir.x * distance;
    state.position.z += dir.z * distance;

    if input.jump_edge {
        state.velocity.y += config.jump_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_integrate_moves_planar() {
        let mut state = PlayerStateSnapshot::default();
        let input = PlayerInputSnapshot {
            move_direction: Vec3::new(0.0, 5.0, -2.0),
            ..Default::default()
        };
        integrate_remote_input(&mut state, &input, 0.5, &SyncConfig::default());

        let dir = input.move_direction.normalize();
        assert!((state.position.z - dir.z * 3.0).abs() < 1e-5);
        // Vertical component of the direction is not applied.
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_integrate_jump_edge_only() {
        let config = SyncConfig::default();
        let mut state = PlayerStateSnapshot::default();

        let held = PlayerInputSnapshot {
            jump_held: true,
            ..Default::default()
        };
        integrate_remote_input(&mut state, &held, 0.016, &config);
        assert_eq!(state.velocity.y, 0.0);

        let edge = PlayerInputSnapshot {
            jump_held: true,
            jump_edge: true,
            ..Default::default()
        };
        integrate_remote_input(&mut state, &edge, 0.016, &config);
        assert_eq!(state.velocity.y, 15.0);
    }

    #[test]
    fn test_integrate_zero_direction() {
        let mut state = PlayerStateSnapshot {
            position: Vec3::ONE,
            ..Default::default()
        };
        integrate_remote_input(
            &mut state,
            &PlayerInputSnapshot::default(),
            1.0,
            &SyncConfig::default(),
        );
        assert_eq!(state.position, Vec3::ONE);
    }
}
