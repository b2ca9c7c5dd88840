//! Tandem - Core constants and error types.
//!
//! This module provides the values shared by every layer of the crate.
//! It has no optional dependencies.

mod constants;
mod error;

pub use constants::*;
pub use error::*;
