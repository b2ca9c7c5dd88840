//! Headless stand-in for the game simulation.
//!
//! Both avatars run along -X toward a goal line. Each process scripts its own
//! avatar's keys; the host also animates the platforms.

use glam::Vec3;
use tandem_sync::sync::{MovementKeys, Platform, RaceResultView, Simulation, ViewMode};
use tandem_sync::wire::{PlatformKind, PlayerStateSnapshot};
use tracing::info;

const GOAL_X: f32 = -30.0;
const GRAVITY: f32 = -30.0;

/// Platforms of a stage, built in the same order on both ends.
fn build_platforms(stage: i32) -> Vec<Platform> {
    let offset = stage as f32 * 10.0;
    vec![
        Platform::new(PlatformKind::Static, Vec3::new(0.0, -1.0, offset)),
        Platform::new(PlatformKind::Moving, Vec3::new(-5.0, 0.0, offset)),
        Platform::new(PlatformKind::Rotating, Vec3::new(-10.0, 0.0, offset)),
        Platform::new(PlatformKind::Patrolling, Vec3::new(-15.0, 0.0, offset)),
        Platform::new(
            PlatformKind::CycleDisappearing,
            Vec3::new(-20.0, 0.0, offset),
        ),
    ]
}

pub struct Arena {
    pub local: PlayerStateSnapshot,
    pub remote: PlayerStateSnapshot,
    platforms: Vec<Platform>,
    stage: i32,
    clock: f32,
    speed_scale: f32,
    tick: u32,
    pub result: Option<RaceResultView>,
}

impl Arena {
    /// `speed_scale` slows the scripted local runner, so the two ends differ.
    pub fn new(speed_scale: f32) -> Self {
        Self {
            local: PlayerStateSnapshot::default(),
            remote: PlayerStateSnapshot::default(),
            platforms: Vec::new(),
            stage: 0,
            clock: 0.0,
            speed_scale,
            tick: 0,
            result: None,
        }
    }

    /// Host-side physics for one tick.
    pub fn step_host(&mut self, dt: f32) {
        self.clock += dt;
        self.tick += 1;

        let keys = self.movement_keys();
        if keys.forward {
            self.local.position.x -= 6.0 * self.speed_scale * dt;
        }
        for player in [&mut self.local, &mut self.remote] {
            player.velocity.y += GRAVITY * dt;
            player.position.y = (player.position.y + player.velocity.y * dt).max(0.0);
            if player.position.y == 0.0 {
                player.velocity.y = 0.0;
            }
        }

        for platform in &mut self.platforms {
            match platform {
                Platform::Moving { move_timer, .. } => *move_timer += dt,
                Platform::Rotating { rotation_angle, .. } => *rotation_angle += dt,
                Platform::Patrolling {
                    patrol_index,
                    patrol_timer,
                    ..
                } => {
                    *patrol_timer += dt;
                    if *patrol_timer > 1.0 {
                        *patrol_timer = 0.0;
                        *patrol_index = (*patrol_index + 1) % 4;
                    }
                }
                Platform::CycleDisappearing {
                    cycle_timer,
                    visible,
                    blink_alpha,
                    ..
                } => {
                    *cycle_timer = (*cycle_timer + dt) % 3.0;
                    *visible = *cycle_timer < 2.0;
                    *blink_alpha = if *visible { 1.0 } else { 0.0 };
                }
                Platform::Static { .. } | Platform::Other { .. } => {}
            }
        }
    }

    pub fn stage(&self) -> i32 {
        self.stage
    }
}

impl Simulation for Arena {
    fn local_player(&self) -> PlayerStateSnapshot {
        self.local
    }

    fn set_local_player(&mut self, state: PlayerStateSnapshot) {
        self.local = state;
    }

    fn remote_player(&self) -> PlayerStateSnapshot {
        self.remote
    }

    fn set_remote_player(&mut self, state: PlayerStateSnapshot) {
        self.remote = state;
    }

    fn movement_keys(&self) -> MovementKeys {
        MovementKeys {
            forward: self.result.is_none(),
            jump: self.tick % 90 < 2,
            ..Default::default()
        }
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::ThirdPerson
    }

    fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    fn platforms_mut(&mut self) -> &mut [Platform] {
        &mut self.platforms
    }

    fn local_goal_time(&self) -> Option<f32> {
        (self.local.position.x <= GOAL_X).then_some(self.clock)
    }

    fn remote_goal_time(&self) -> Option<f32> {
        (self.remote.position.x <= GOAL_X).then_some(self.clock)
    }

    fn load_stage(&mut self, stage: i32) {
        info!(stage, "loading stage");
        self.stage = stage;
        self.platforms = build_platforms(stage);
        self.local = PlayerStateSnapshot::default();
        self.remote = PlayerStateSnapshot::default();
        self.clock = 0.0;
        self.tick = 0;
        self.result = None;
    }

    fn show_race_result(&mut self, view: RaceResultView) {
        self.result = Some(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_builds_platforms() {
        let mut arena = Arena::new(1.0);
        arena.load_stage(2);
        assert_eq!(arena.stage(), 2);
        assert_eq!(arena.platforms().len(), 5);
        assert_eq!(arena.platforms()[2].kind(), PlatformKind::Rotating);
    }

    #[test]
    fn test_host_runner_reaches_goal() {
        let mut arena = Arena::new(1.0);
        arena.load_stage(1);
        for _ in 0..600 {
            arena.step_host(1.0 / 60.0);
        }
        assert!(arena.local_goal_time().is_some());
        assert!(arena.remote_goal_time().is_none());
    }
}
