//! Tandem - Synchronization Policy
//!
//! Per-tick game-level use of a [`Session`](crate::session::Session):
//! - Host is authoritative: it simulates both avatars and broadcasts them
//! - Client submits input only and renders an interpolated mirror
//! - One-shot events (goal reached, stage change) are applied once
//!
//! The game plugs in through the [`Simulation`] trait.

mod config;
mod input;
mod interpolation;
mod platform;
mod policy;
mod race;
mod world;

pub use config::*;
pub use input::*;
pub use interpolation::*;
pub use platform::*;
pub use policy::*;
pub use race::*;
pub use world::*;
