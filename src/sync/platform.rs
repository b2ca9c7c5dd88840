//! Dynamic platform model and its snapshot mapping.
//!
//! Each variant carries only the fields that are synchronized for its kind.
//! Applying a snapshot copies those fields and nothing else; a snapshot of
//! a different kind is ignored.

use glam::Vec3;
use tracing::debug;

use crate::wire::{PlatformKind, PlatformStateSnapshot, PlatformStateUpdate};

/// Synchronized state of one platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Platform {
    /// Fixed in place.
    Static {
        /// World position.
        position: Vec3,
    },
    /// Travels a path once boarded.
    Moving {
        /// World position.
        position: Vec3,
        /// Time along the path.
        move_timer: f32,
        /// A player is standing on it.
        occupied: bool,
    },
    /// Spins about its own axis.
    Rotating {
        /// World position.
        position: Vec3,
        /// Current angle.
        rotation_angle: f32,
    },
    /// Walks a loop of waypoints.
    Patrolling {
        /// World position.
        position: Vec3,
        /// Current waypoint.
        patrol_index: i32,
        /// Time toward the next waypoint.
        patrol_timer: f32,
    },
    /// Appears and disappears on a cycle.
    CycleDisappearing {
        /// World position.
        position: Vec3,
        /// Time within the cycle.
        cycle_timer: f32,
        /// Currently solid and drawn.
        visible: bool,
        /// Blink fade value.
        blink_alpha: f32,
    },
    /// Any other platform; position only.
    Other {
        /// World position.
        position: Vec3,
    },
}

impl Platform {
    /// A platform of `kind` at `position` with its timers at zero.
    pub fn new(kind: PlatformKind, position: Vec3) -> Self {
        match kind {
            PlatformKind::Static => Platform::Static { position },
            PlatformKind::Moving => Platform::Moving {
                position,
                move_timer: 0.0,
                occupied: false,
            },
            PlatformKind::Rotating => Platform::Rotating {
                position,
                rotation_angle: 0.0,
            },
            PlatformKind::Patrolling => Platform::Patrolling {
                position,
                patrol_index: 0,
                patrol_timer: 0.0,
            },
            PlatformKind::CycleDisappearing => Platform::CycleDisappearing {
                position,
                cycle_timer: 0.0,
                visible: true,
                blink_alpha: 1.0,
            },
            PlatformKind::Other => Platform::Other { position },
        }
    }

    /// Wire discriminant of this platform.
    pub fn kind(&self) -> PlatformKind {
        match self {
            Platform::Static { .. } => PlatformKind::Static,
            Platform::Moving { .. } => PlatformKind::Moving,
            Platform::Rotating { .. } => PlatformKind::Rotating,
            Platform::Patrolling { .. } => PlatformKind::Patrolling,
            Platform::CycleDisappearing { .. } => PlatformKind::CycleDisappearing,
            Platform::Other { .. } => PlatformKind::Other,
        }
    }

    /// World position.
    pub fn position(&self) -> Vec3 {
        match *self {
            Platform::Static { position }
            | Platform::Moving { position, .. }
            | Platform::Rotating { position, .. }
            | Platform::Patrolling { position, .. }
            | Platform::CycleDisappearing { position, .. }
            | Platform::Other { position } => position,
        }
    }

    /// Capture this platform as the snapshot for collection slot `index`.
    pub fn snapshot(&self, index: i32) -> PlatformStateSnapshot {
        let mut snap = PlatformStateSnapshot::new(index, self.kind(), self.position());
        match *self {
            Platform::Static { .. } | Platform::Other { .. } => {}
            Platform::Moving {
                move_timer,
                occupied,
                ..
            } => {
                snap.move_timer = move_timer;
                snap.occupied = occupied;
            }
            Platform::Rotating { rotation_angle, .. } => {
                snap.rotation_angle = rotation_angle;
            }
            Platform::Patrolling {
                patrol_index,
                patrol_timer,
                ..
            } => {
                snap.patrol_index = patrol_index;
                snap.patrol_timer = patrol_timer;
            }
            Platform::CycleDisappearing {
                cycle_timer,
                visible,
                blink_alpha,
                ..
            } => {
                snap.cycle_timer = cycle_timer;
                snap.visible = visible;
                snap.blink_alpha = blink_alpha;
            }
        }
        snap
    }

    /// Copy the kind-specific fields of `snap` into this platform.
    ///
    /// Returns `false` and leaves the platform untouched when the kinds
    /// differ.
    pub fn apply(&mut self, snap: &PlatformStateSnapshot) -> bool {
        if snap.kind != self.kind() {
            return false;
        }
        match self {
            Platform::Static { position } | Platform::Other { position } => {
                *position = snap.position;
            }
            Platform::Moving {
                position,
                move_timer,
                occupied,
            } => {
                *position = snap.position;
                *move_timer = snap.move_timer;
                *occupied = snap.occupied;
            }
            Platform::Rotating {
                position,
                rotation_angle,
            } => {
                *position = snap.position;
                *rotation_angle = snap.rotation_angle;
            }
            Platform::Patrolling {
                position,
                patrol_index,
                patrol_timer,
            } => {
                *position = snap.position;
                *patrol_index = snap.patrol_index;
                *patrol_timer = snap.patrol_timer;
            }
            Platform::CycleDisappearing {
                position,
                cycle_timer,
                visible,
                blink_alpha,
            } => {
                *position = snap.position;
                *cycle_timer = snap.cycle_timer;
                *visible = snap.visible;
                *blink_alpha = snap.blink_alpha;
            }
        }
        true
    }
}

/// Snapshot every platform, indexed by collection order.
pub fn snapshot_platforms(platforms: &[Platform]) -> PlatformStateUpdate {
    PlatformStateUpdate {
        platforms: platforms
            .iter()
            .enumerate()
            .map(|(i, p)| p.snapshot(i as i32))
            .collect(),
    }
}

/// Apply a received update to the local collection.
///
/// Snapshots with an out-of-range index or a mismatched kind are skipped.
/// Returns how many platforms were updated.
pub fn apply_platform_states(platforms: &mut [Platform], update: &PlatformStateUpdate) -> usize {
    let mut applied = 0;
    for snap in &update.platforms {
        let slot = usize::try_from(snap.index)
            .ok()
            .and_then(|i| platforms.get_mut(i));
        let Some(platform) = slot else {
            debug!(index = snap.index, "platform index out of range");
            continue;
        };
        if platform.apply(snap) {
            applied += 1;
        } else {
            debug!(
                index = snap.index,
                local = ?platform.kind(),
                remote = ?snap.kind,
                "platform kind mismatch; snapshot ignored"
            );
        }
    }
    applied
}
