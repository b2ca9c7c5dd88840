//! # Tandem
//!
//! Real-time state synchronization for two-player games over one TCP stream.
//!
//! One side *hosts* and is authoritative: it simulates both avatars and
//! broadcasts the truth. The other side *connects*, submits its input, and
//! renders an interpolated mirror of the host's world.
//!
//! - **Non-blocking**: socket waiting happens on background tasks; the game
//!   loop only polls
//! - **Last value wins**: live state is delivered as "newest unread" per kind
//! - **Exactly once**: race results go through a single-delivery channel
//! - **Portable**: explicit little-endian wire encoding, versioned hello
//!
//! ## Feature Flags
//!
//! - `transport` (default): framed TCP transport and the [`session`] layer
//! - `sync` (default): per-tick synchronization policy
//!
//! ## Modules
//!
//! - [`core`]: Constants and codec errors (always included)
//! - [`wire`]: Message kinds, header, and payload encoding (always included)
//! - [`transport`]: Framing and connection establishment (requires `transport`)
//! - [`session`]: Session handle and mailboxes (requires `transport`)
//! - [`sync`]: Host/client tick policy (requires `sync`)
//!
//! ## Example Usage
//!
//! ```no_run
//! use tandem_sync::prelude::*;
//!
//! let mut session = Session::new(SessionConfig::default())?;
//! session.set_connection_callback(|connected| {
//!     println!("peer {}", if connected { "joined" } else { "left" });
//! });
//! session.connect_to_host("192.168.1.20", DEFAULT_PORT)?;
//!
//! // game loop
//! let mut policy = SyncPolicy::default();
//! # struct World;
//! # impl Simulation for World {
//! #     fn local_player(&self) -> PlayerStateSnapshot { Default::default() }
//! #     fn set_local_player(&mut self, _: PlayerStateSnapshot) {}
//! #     fn remote_player(&self) -> PlayerStateSnapshot { Default::default() }
//! #     fn set_remote_player(&mut self, _: PlayerStateSnapshot) {}
//! #     fn movement_keys(&self) -> MovementKeys { Default::default() }
//! #     fn view_mode(&self) -> ViewMode { ViewMode::ThirdPerson }
//! #     fn platforms(&self) -> &[Platform] { &[] }
//! #     fn platforms_mut(&mut self) -> &mut [Platform] { &mut [] }
//! #     fn local_goal_time(&self) -> Option<f32> { None }
//! #     fn remote_goal_time(&self) -> Option<f32> { None }
//! #     fn load_stage(&mut self, _: i32) {}
//! #     fn show_race_result(&mut self, _: RaceResultView) {}
//! # }
//! # let mut world = World;
//! loop {
//!     let report = policy.tick(&session, &mut world, 1.0 / 60.0);
//!     if report.goal.is_some() {
//!         break;
//!     }
//! }
//! # Ok::<(), SessionError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Wire codec (always included)
pub mod wire;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Session manager (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod session;

// Sync policy (feature-gated)
#[cfg(feature = "sync")]
#[cfg_attr(docsrs, doc(cfg(feature = "sync")))]
pub mod sync;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::wire::*;

    #[cfg(feature = "transport")]
    pub use crate::transport::{
        ConnectionRole, ConnectionState, TransportError, TransportResult, local_ip_address,
    };

    #[cfg(feature = "transport")]
    pub use crate::session::{Session, SessionConfig, SessionConfigBuilder, SessionError};

    #[cfg(feature = "sync")]
    pub use crate::sync::*;
}

// Re-export commonly used items at crate root
pub use crate::core::{CodecError, DEFAULT_PORT, WIRE_VERSION};
pub use crate::wire::{Message, MessageKind};

#[cfg(feature = "transport")]
pub use crate::session::{Session, SessionConfig, SessionError};

#[cfg(feature = "sync")]
pub use crate::sync::{Simulation, SyncConfig, SyncPolicy};
