//! Local input sampling.
//!
//! Turns the held movement keys into a planar direction whose basis depends
//! on the active camera, and tracks jump as both level (held) and edge
//! (pressed this tick).

use glam::Vec3;

use crate::wire::PlayerInputSnapshot;

/// Movement and jump keys held this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementKeys {
    /// Forward (W / Up).
    pub forward: bool,
    /// Backward (S / Down).
    pub backward: bool,
    /// Left (A / Left).
    pub left: bool,
    /// Right (D / Right).
    pub right: bool,
    /// Jump (Space).
    pub jump: bool,
}

/// Active camera, which decides the basis of the movement vector.
///
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ViewMode {
    /// Detached free camera.
    FreeCamera {
        /// Heading.
        yaw: f32,
        /// Elevation.
        pitch: f32,
    },
    /// Camera at the player's eyes.
    FirstPerson {
        /// Heading.
        yaw: f32,
        /// Elevation.
        pitch: f32,
    },
    /// Fixed chase camera looking down -X.
    #[default]
    ThirdPerson,
}

/// Unnormalized movement vector for `keys` under `view`.
pub fn movement_basis(keys: MovementKeys, view: ViewMode) -> Vec3 {
    let mut dir = Vec3::ZERO;
    match view {
        ViewMode::FreeCamera { yaw, pitch } | ViewMode::FirstPerson { yaw, pitch } => {
            let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
            let cos_pitch = pitch.to_radians().cos();
            if keys.forward {
                dir.x -= cos_yaw * cos_pitch;
                dir.z -= sin_yaw * cos_pitch;
            }
            if keys.backward {
                dir.x += cos_yaw * cos_pitch;
                dir.z += sin_yaw * cos_pitch;
            }
            if keys.left {
                dir.x -= sin_yaw;
                dir.z += cos_yaw;
            }
            if keys.right {
                dir.x += sin_yaw;
                dir.z -= cos_yaw;
            }
        }
        ViewMode::ThirdPerson => {
            if keys.forward {
                dir.x -= 1.0;
            }
            if keys.backward {
                dir.x += 1.0;
            }
            if keys.left {
                dir.z += 1.0;
            }
            if keys.right {
                dir.z -= 1.0;
            }
        }
    }
    dir
}

/// Builds one [`PlayerInputSnapshot`] per tick.
///
/// Holds the previous jump state for edge detection, so use one sampler per
/// local player.
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    last_jump: bool,
}

impl InputSampler {
    /// Create a sampler with jump released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample this tick's input.
    ///
    /// The direction is normalized unless it is zero (opposing keys cancel
    /// to zero and stay zero).
    pub fn sample(&mut self, keys: MovementKeys, view: ViewMode, dt: f32) -> PlayerInputSnapshot {
        let jump_edge = keys.jump && !self.last_jump;
        self.last_jump = keys.jump;

        PlayerInputSnapshot {
            move_direction: movement_basis(keys, view).normalize_or_zero(),
            jump_held: keys.jump,
            jump_edge,
            frame_delta: dt,
        }
    }

    /// Forget the previous jump state.
    pub fn reset(&mut self) {
        self.last_jump = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn keys() -> MovementKeys {
        MovementKeys::default()
    }

    #[test]
    fn test_third_person_basis() {
        let forward = MovementKeys {
            forward: true,
            ..keys()
        };
        let dir = movement_basis(forward, ViewMode::ThirdPerson);
        assert_eq!(dir, Vec3::new(-1.0, 0.0, 0.0));

        let left = MovementKeys {
            left: true,
            ..keys()
        };
        let dir = movement_basis(left, ViewMode::ThirdPerson);
        assert_eq!(dir, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_camera_basis_follows_yaw() {
        let forward = MovementKeys {
            forward: true,
            ..keys()
        };
        let view = ViewMode::FirstPerson {
            yaw: 90.0,
            pitch: 0.0,
        };
        let dir = movement_basis(forward, view);
        assert!(dir.x.abs() < EPS);
        assert!((dir.z + 1.0).abs() < EPS);

        let free = ViewMode::FreeCamera {
            yaw: 90.0,
            pitch: 0.0,
        };
        assert!(movement_basis(forward, free).abs_diff_eq(dir, EPS));
    }

    #[test]
    fn test_sample_normalizes_diagonal() {
        let mut sampler = InputSampler::new();
        let diagonal = MovementKeys {
            forward: true,
            left: true,
            ..keys()
        };
        let input = sampler.sample(diagonal, ViewMode::ThirdPerson, 0.016);
        assert!((input.move_direction.length() - 1.0).abs() < EPS);
        assert_eq!(input.frame_delta, 0.016);
    }

    #[test]
    fn test_zero_direction_not_normalized() {
        let mut sampler = InputSampler::new();
        let opposed = MovementKeys {
            forward: true,
            backward: true,
            ..keys()
        };
        let input = sampler.sample(opposed, ViewMode::ThirdPerson, 0.016);
        assert_eq!(input.move_direction, Vec3::ZERO);
        assert!(!input.move_direction.x.is_nan());
    }

    #[test]
    fn test_jump_edge_and_level() {
        let mut sampler = InputSampler::new();
        let jump = MovementKeys {
            jump: true,
            ..keys()
        };

        let first = sampler.sample(jump, ViewMode::ThirdPerson, 0.016);
        assert!(first.jump_held && first.jump_edge);

        let held = sampler.sample(jump, ViewMode::ThirdPerson, 0.016);
        assert!(held.jump_held && !held.jump_edge);

        let released = sampler.sample(keys(), ViewMode::ThirdPerson, 0.016);
        assert!(!released.jump_held && !released.jump_edge);

        let again = sampler.sample(jump, ViewMode::ThirdPerson, 0.016);
        assert!(again.jump_edge);
    }
}
