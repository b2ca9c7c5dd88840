//! Per-tick synchronization policy.
//!
//! ```text
//! Disconnected      no-op
//! Connected + Host  drain input -> simulate remote -> broadcast players,
//!                   platforms -> detect goal, send once
//! Connected + Client
//!                   stage -> send input -> apply players (local direct,
//!                   remote interpolated) -> platforms -> goal once
//! ```

use tracing::{debug, info, warn};

use crate::core::{CLIENT_PLAYER_ID, HOST_PLAYER_ID};
use crate::session::{Session, SessionError};
use crate::transport::ConnectionRole;
use crate::wire::{GameStateUpdate, GoalEvent, PlayerStateSnapshot, StageSelection};

use super::config::SyncConfig;
use super::input::InputSampler;
use super::interpolation::RemoteInterpolation;
use super::platform::{apply_platform_states, snapshot_platforms};
use super::race::RaceState;
use super::world::Simulation;

/// What one [`SyncPolicy::tick`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Client: input snapshot queued.
    pub sent_input: bool,
    /// Host: a client input was applied to the remote avatar.
    pub applied_remote_input: bool,
    /// Host: player and platform state queued.
    pub broadcast: bool,
    /// Client: an authoritative player update was applied.
    pub applied_game_state: bool,
    /// Client: number of platforms updated.
    pub applied_platforms: usize,
    /// Client: stage loaded on the host's instruction.
    pub stage_loaded: Option<i32>,
    /// Goal result recorded this tick.
    pub goal: Option<GoalEvent>,
}

/// Drives a [`Simulation`] from a [`Session`] once per game tick.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    config: SyncConfig,
    sampler: InputSampler,
    interpolation: RemoteInterpolation,
    race: RaceState,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl SyncPolicy {
    /// Create a policy with `config`.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            sampler: InputSampler::new(),
            interpolation: RemoteInterpolation::new(config.interpolation_window),
            race: RaceState::default(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Current race state.
    pub fn race(&self) -> &RaceState {
        &self.race
    }

    /// Client-side remote avatar interpolation.
    pub fn interpolation(&self) -> &RemoteInterpolation {
        &self.interpolation
    }

    /// Forget per-race state (interpolation target, jump edge, results).
    pub fn reset(&mut self) {
        self.sampler.reset();
        self.interpolation.reset();
        self.race = RaceState::default();
    }

    /// Run one tick. A no-op while disconnected.
    pub fn tick<S: Simulation>(&mut self, session: &Session, sim: &mut S, dt: f32) -> TickReport {
        if !session.is_connected() {
            return TickReport::default();
        }
        match session.role() {
            ConnectionRole::Host => self.tick_host(session, sim, dt),
            ConnectionRole::Client => self.tick_client(session, sim, dt),
            ConnectionRole::Unset => TickReport::default(),
        }
    }

    /// Host: announce `stage`, then load it locally and start a new race.
    ///
    /// Loads locally even when no client is connected yet.
    pub fn select_stage<S: Simulation>(
        &mut self,
        session: &Session,
        sim: &mut S,
        stage: i32,
    ) -> Result<(), SessionError> {
        if session.role() != ConnectionRole::Host {
            return Err(SessionError::WrongRole {
                required: ConnectionRole::Host,
            });
        }
        match session.try_send_stage_selection(&StageSelection { stage }) {
            Ok(()) | Err(SessionError::NotConnected) => {}
            Err(e) => return Err(e),
        }
        info!(stage, "stage selected");
        self.enter_stage(sim, stage);
        Ok(())
    }

    fn enter_stage<S: Simulation>(&mut self, sim: &mut S, stage: i32) {
        sim.load_stage(stage);
        sim.reset_view();
        self.sampler.reset();
        self.interpolation.reset();
        self.race.start();
    }

    fn tick_host<S: Simulation>(&mut self, session: &Session, sim: &mut S, dt: f32) -> TickReport {
        let mut report = TickReport::default();

        if let Some(input) = session.try_take_player_input() {
            sim.apply_remote_input(&input, dt, &self.config);
            report.applied_remote_input = true;
        }

        let update = GameStateUpdate {
            host_player: sim.local_player(),
            client_player: sim.remote_player(),
        };
        let players = session.try_send_game_state(&update);
        let platforms = session.try_send_platform_states(&snapshot_platforms(sim.platforms()));
        report.broadcast = players.is_ok() && platforms.is_ok();
        log_send("game state", players);
        log_send("platform state", platforms);

        report.goal = self.detect_goal(session, sim);
        report
    }

    fn detect_goal<S: Simulation>(&mut self, session: &Session, sim: &mut S) -> Option<GoalEvent> {
        if self.race.finished {
            let runner_up = match self.race.winner_player_id {
                HOST_PLAYER_ID => sim.remote_goal_time(),
                _ => sim.local_goal_time(),
            };
            if let Some(time) = runner_up {
                self.race.record_runner_up(time);
            }
            return None;
        }

        let event = if let Some(clear_time) = sim.local_goal_time() {
            GoalEvent {
                player_id: HOST_PLAYER_ID,
                clear_time,
            }
        } else if let Some(clear_time) = sim.remote_goal_time() {
            GoalEvent {
                player_id: CLIENT_PLAYER_ID,
                clear_time,
            }
        } else {
            return None;
        };

        self.race.record(event);
        info!(
            player_id = event.player_id,
            clear_time = event.clear_time,
            "goal reached"
        );
        log_send("goal", session.try_send_goal_reached(&event));
        if let Some(view) = self.race.view(ConnectionRole::Host) {
            sim.show_race_result(view);
        }
        Some(event)
    }

    fn tick_client<S: Simulation>(
        &mut self,
        session: &Session,
        sim: &mut S,
        dt: f32,
    ) -> TickReport {
        let mut report = TickReport::default();

        // Stage before goal: a goal queued behind the selection is for the new race.
        if let Some(selection) = session.try_take_stage_selection() {
            info!(stage = selection.stage, "host selected stage");
            self.enter_stage(sim, selection.stage);
            report.stage_loaded = Some(selection.stage);
        }

        let input = self.sampler.sample(sim.movement_keys(), sim.view_mode(), dt);
        let sent = session.try_send_player_input(&input);
        report.sent_input = sent.is_ok();
        log_send("player input", sent);

        if let Some(update) = session.try_take_game_state() {
            sim.set_local_player(update.client_player);

            let current = sim.remote_player().position;
            self.interpolation.retarget(current, update.host_player.position);
            sim.set_remote_player(PlayerStateSnapshot {
                position: current,
                ..update.host_player
            });
            report.applied_game_state = true;
        }

        if let Some(position) = self.interpolation.advance(dt) {
            let mut remote = sim.remote_player();
            remote.position = position;
            sim.set_remote_player(remote);
        }

        if let Some(update) = session.try_take_platform_states() {
            report.applied_platforms = apply_platform_states(sim.platforms_mut(), &update);
        }

        if let Some(event) = session.try_take_goal_reached() {
            if self.race.record(event) {
                info!(
                    player_id = event.player_id,
                    clear_time = event.clear_time,
                    "race finished"
                );
                if let Some(view) = self.race.view(ConnectionRole::Client) {
                    sim.show_race_result(view);
                }
                report.goal = Some(event);
            } else {
                debug!(player_id = event.player_id, "race result already recorded");
            }
        }

        report
    }
}

fn log_send(what: &str, result: Result<(), SessionError>) {
    match result {
        Ok(()) => {}
        // The peer can drop between the connection check and the send.
        Err(SessionError::NotConnected) => debug!("{} not sent: not connected", what),
        Err(e) => warn!("failed to send {}: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionConfig, SessionConfigBuilder};
    use crate::sync::{MovementKeys, NO_WINNER, Platform, RaceResultView, ViewMode};
    use crate::wire::PlatformKind;
    use glam::Vec3;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::{Duration, Instant};

    #[derive(Debug, Default)]
    struct TestWorld {
        local: PlayerStateSnapshot,
        remote: PlayerStateSnapshot,
        keys: MovementKeys,
        platforms: Vec<Platform>,
        local_goal: Option<f32>,
        remote_goal: Option<f32>,
        stages: Vec<i32>,
        view_resets: usize,
        results: Vec<RaceResultView>,
    }

    impl Simulation for TestWorld {
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
            self.keys
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
            self.local_goal
        }
        fn remote_goal_time(&self) -> Option<f32> {
            self.remote_goal
        }
        fn load_stage(&mut self, stage: i32) {
            self.stages.push(stage);
        }
        fn reset_view(&mut self) {
            self.view_resets += 1;
        }
        fn show_race_result(&mut self, view: RaceResultView) {
            self.results.push(view);
        }
    }

    fn config() -> SessionConfig {
        SessionConfigBuilder::new()
            .bind_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .build()
    }

    fn connected_pair() -> (Session, Session) {
        let mut host = Session::new(config()).unwrap();
        host.start_host(0).unwrap();
        let port = host.local_addr().unwrap().port();
        let mut client = Session::new(config()).unwrap();
        client.connect_to_host("127.0.0.1", port).unwrap();
        assert!(pump(|| host.is_connected() && client.is_connected()));
        (host, client)
    }

    fn pump(mut step: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if step() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn platforms() -> Vec<Platform> {
        vec![
            Platform::new(PlatformKind::Static, Vec3::ZERO),
            Platform::new(PlatformKind::Rotating, Vec3::X),
        ]
    }

    #[test]
    fn test_disconnected_tick_is_noop() {
        let session = Session::new(config()).unwrap();
        let mut policy = SyncPolicy::default();
        let mut world = TestWorld::default();
        assert_eq!(
            policy.tick(&session, &mut world, 0.016),
            TickReport::default()
        );
    }

    #[test]
    fn test_host_simulates_client_input() {
        let (host, client) = connected_pair();
        let mut host_policy = SyncPolicy::default();
        let mut client_policy = SyncPolicy::default();
        let mut host_world = TestWorld::default();
        let mut client_world = TestWorld {
            keys: MovementKeys {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let report = client_policy.tick(&client, &mut client_world, 0.016);
        assert!(report.sent_input);

        assert!(pump(|| host_policy
            .tick(&host, &mut host_world, 0.5)
            .applied_remote_input));
        // Third-person forward is -X at 6 units/s.
        assert!((host_world.remote.position.x + 3.0).abs() < 1e-5);
        assert_eq!(host_world.local, PlayerStateSnapshot::default());
    }

    #[test]
    fn test_client_applies_authoritative_state() {
        let (host, client) = connected_pair();
        let mut host_policy = SyncPolicy::default();
        let mut client_policy = SyncPolicy::default();

        let mut host_world = TestWorld {
            local: PlayerStateSnapshot {
                position: Vec3::new(10.0, 0.0, 0.0),
                velocity: Vec3::Y,
                facing_backward: true,
                showing_front_face: false,
            },
            remote: PlayerStateSnapshot {
                position: Vec3::new(0.0, 2.0, 0.0),
                ..Default::default()
            },
            platforms: platforms(),
            ..Default::default()
        };
        if let Platform::Rotating { rotation_angle, .. } = &mut host_world.platforms[1] {
            *rotation_angle = 0.5;
        }
        let mut client_world = TestWorld {
            platforms: platforms(),
            ..Default::default()
        };

        assert!(host_policy.tick(&host, &mut host_world, 0.016).broadcast);

        let mut applied = TickReport::default();
        assert!(pump(|| {
            let report = client_policy.tick(&client, &mut client_world, 0.0);
            applied.applied_game_state |= report.applied_game_state;
            applied.applied_platforms += report.applied_platforms;
            applied.applied_game_state && applied.applied_platforms > 0
        }));

        // Local avatar is overwritten directly.
        assert_eq!(client_world.local, host_world.remote);
        // Remote avatar takes host flags now, position only via interpolation.
        assert!(client_world.remote.facing_backward);
        assert_eq!(client_world.remote.velocity, Vec3::Y);
        assert_eq!(
            client_policy.interpolation().target(),
            Some(Vec3::new(10.0, 0.0, 0.0))
        );
        assert_eq!(client_world.platforms, host_world.platforms);

        // Let the window elapse with no further updates.
        for _ in 0..10 {
            client_policy.tick(&client, &mut client_world, 0.02);
        }
        assert_eq!(client_world.remote.position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_goal_race() {
        let (host, client) = connected_pair();
        let mut host_policy = SyncPolicy::default();
        let mut client_policy = SyncPolicy::default();
        let mut host_world = TestWorld {
            local_goal: Some(12.34),
            ..Default::default()
        };
        let mut client_world = TestWorld::default();

        let first = host_policy.tick(&host, &mut host_world, 0.016);
        assert_eq!(
            first.goal,
            Some(GoalEvent {
                player_id: 0,
                clear_time: 12.34,
            })
        );
        // Sent once: later ticks do not re-detect.
        host_world.remote_goal = Some(15.0);
        assert_eq!(host_policy.tick(&host, &mut host_world, 0.016).goal, None);
        assert_eq!(host_policy.race().loser_time, Some(15.0));
        assert_eq!(host_world.results.len(), 1);
        assert!(host_world.results[0].local_won);

        assert!(pump(|| client_policy
            .tick(&client, &mut client_world, 0.016)
            .goal
            .is_some()));
        for _ in 0..5 {
            client_policy.tick(&client, &mut client_world, 0.016);
        }

        let race = client_policy.race();
        assert!(race.finished);
        assert_eq!(race.winner_player_id, 0);
        assert_eq!(race.winner_time, 12.34);
        assert_eq!(client_world.results.len(), 1);
        assert!(!client_world.results[0].local_won);
    }

    #[test]
    fn test_stage_selection_propagates() {
        let (host, client) = connected_pair();
        let mut host_policy = SyncPolicy::default();
        let mut client_policy = SyncPolicy::default();
        let mut host_world = TestWorld::default();
        let mut client_world = TestWorld::default();

        host_policy.select_stage(&host, &mut host_world, 3).unwrap();
        assert_eq!(host_world.stages, vec![3]);
        assert!(host_policy.race().started);

        assert!(pump(|| client_policy
            .tick(&client, &mut client_world, 0.016)
            .stage_loaded
            == Some(3)));
        assert_eq!(client_world.stages, vec![3]);
        assert_eq!(client_world.view_resets, 1);
        assert!(client_policy.race().started);

        assert!(matches!(
            client_policy.select_stage(&client, &mut client_world, 1),
            Err(SessionError::WrongRole {
                required: ConnectionRole::Host
            })
        ));
    }

    #[test]
    fn test_goal_from_previous_stage_not_carried_over() {
        let (host, client) = connected_pair();
        let mut host_policy = SyncPolicy::default();
        let mut client_policy = SyncPolicy::default();
        let mut host_world = TestWorld::default();
        let mut client_world = TestWorld::default();

        host_policy.select_stage(&host, &mut host_world, 1).unwrap();
        host_world.local_goal = Some(12.34);
        let report = host_policy.tick(&host, &mut host_world, 0.016);
        assert!(report.goal.is_some());
        host_world.local_goal = None;
        host_policy.select_stage(&host, &mut host_world, 2).unwrap();
        assert!(!host_policy.race().finished);

        assert!(pump(|| {
            client_policy.tick(&client, &mut client_world, 0.016);
            client_world.stages.last() == Some(&2)
        }));
        for _ in 0..5 {
            let report = client_policy.tick(&client, &mut client_world, 0.016);
            assert_eq!(report.goal, None);
        }

        assert!(client_policy.race().started);
        assert!(!client_policy.race().finished);
        assert_eq!(client_policy.race().winner_player_id, NO_WINNER);
    }
}
