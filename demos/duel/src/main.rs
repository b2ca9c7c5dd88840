//! Tandem Duel
//!
//! Headless two-process race over a real socket. Run one host and one
//! client:
//!
//! ```text
//! TANDEM_MODE=host   cargo run -p tandem-duel
//! TANDEM_MODE=client TANDEM_HOST=127.0.0.1 cargo run -p tandem-duel
//! ```
//!
//! Environment variables:
//! - TANDEM_MODE: "host" or "client"
//! - TANDEM_HOST: Host address to connect to (client only, default 127.0.0.1)
//! - TANDEM_PORT: Port (default 12345)
//! - TANDEM_TICKS: Ticks to run after connecting (default 1800)
//! - TANDEM_STAGE: Stage the host selects (default 1)
//! - RUST_LOG: tracing filter (default info)

mod arena;
mod config;

use std::thread;
use std::time::{Duration, Instant};

use tandem_sync::session::{Session, SessionConfig, SessionError};
use tandem_sync::sync::SyncPolicy;
use tandem_sync::transport::ConnectionState;
use thiserror::Error;
use tracing::{error, info, warn};

use arena::Arena;
use config::{ConfigError, DuelConfig, Mode};

const TICK: Duration = Duration::from_micros(16_667);

#[derive(Debug, Error)]
enum DuelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("could not reach the host")]
    ConnectFailed,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DuelError> {
    let config = DuelConfig::from_env()?;
    let mut session = Session::new(SessionConfig::default())?;
    session.set_connection_callback(|connected| {
        info!(connected, "connection changed");
    });

    match config.mode {
        Mode::Host => {
            session.start_host(config.port)?;
            match session.advertised_ip() {
                Some(ip) => info!("players can join at {}:{}", ip, config.port),
                None => warn!("no outward-facing address found"),
            }
        }
        Mode::Client => session.connect_to_host(&config.host, config.port)?,
    }

    while !session.is_connected() {
        if session.state() == ConnectionState::Disconnected {
            return Err(DuelError::ConnectFailed);
        }
        thread::sleep(TICK);
    }

    let mut policy = SyncPolicy::default();
    let mut arena = match config.mode {
        Mode::Host => Arena::new(0.9),
        Mode::Client => Arena::new(1.0),
    };
    if config.mode == Mode::Host {
        policy.select_stage(&session, &mut arena, config.stage)?;
    }

    let dt = TICK.as_secs_f32();
    for _ in 0..config.ticks {
        let started = Instant::now();
        if !session.is_connected() {
            warn!("peer left");
            break;
        }

        if config.mode == Mode::Host {
            arena.step_host(dt);
        }
        let report = policy.tick(&session, &mut arena, dt);
        if let Some(goal) = report.goal {
            info!(
                player_id = goal.player_id,
                clear_time = goal.clear_time,
                stage = arena.stage(),
                "race decided"
            );
        }

        thread::sleep(TICK.saturating_sub(started.elapsed()));
    }

    match arena.result {
        Some(view) if view.local_won => info!(time = view.winner_time, "you win"),
        Some(view) => info!(time = view.winner_time, "you lose"),
        None => info!("no result"),
    }
    info!(
        local = ?arena.local.position,
        remote = ?arena.remote.position,
        "final positions"
    );

    session.disconnect();
    Ok(())
}
