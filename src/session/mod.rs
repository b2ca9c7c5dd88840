//! Tandem - Session Manager
//!
//! The facade the game loop talks to. One [`Session`] holds at most one
//! connection, in either the host or the client role, and exposes:
//!
//! - `start_host` / `connect_to_host` / `disconnect` for the lifecycle
//! - `try_send_*` to queue outbound messages without blocking
//! - `try_take_*` to poll the newest inbound value of each kind
//!
//! Live-state kinds keep only their newest unread value ([`Mailbox`]);
//! goal events are delivered exactly once ([`GoalChannel`]).

mod config;
mod error;
mod mailbox;
#[allow(clippy::module_inception)]
mod session;

pub use config::*;
pub use error::*;
pub use mailbox::*;
pub use session::*;
