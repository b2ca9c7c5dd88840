//! Synchronization policy configuration.

use crate::core::{DEFAULT_INTERPOLATION_WINDOW, DEFAULT_JUMP_VELOCITY, DEFAULT_MOVE_SPEED};

/// Tuning for [`SyncPolicy`](super::SyncPolicy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// Seconds over which the client blends the remote avatar to a new target.
    pub interpolation_window: f32,

    /// Planar speed (units/s) of the default remote-input integrator.
    pub move_speed: f32,

    /// Vertical impulse added on a jump edge by the default integrator.
    pub jump_velocity: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interpolation_window: DEFAULT_INTERPOLATION_WINDOW,
            move_speed: DEFAULT_MOVE_SPEED,
            jump_velocity: DEFAULT_JUMP_VELOCITY,
        }
    }
}

impl SyncConfig {
    /// Set the interpolation window. Negative values are treated as zero.
    pub fn with_interpolation_window(mut self, seconds: f32) -> Self {
        self.interpolation_window = seconds.max(0.0);
        self
    }

    /// Set the remote-input move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Set the remote-input jump impulse.
    pub fn with_jump_velocity(mut self, velocity: f32) -> Self {
        self.jump_velocity = velocity;
        self
    }
}
