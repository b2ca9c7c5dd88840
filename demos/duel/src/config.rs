//! Demo configuration from environment variables.

use std::env;
use std::str::FromStr;

use tandem_sync::DEFAULT_PORT;
use thiserror::Error;

/// Errors reading the demo configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `TANDEM_MODE` is missing or not `host`/`client`.
    #[error("TANDEM_MODE must be \"host\" or \"client\", got {0:?}")]
    Mode(String),

    /// A numeric variable did not parse.
    #[error("{name} is not a valid number: {value:?}")]
    Number {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Which side this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Host,
    Client,
}

/// Resolved demo settings.
#[derive(Debug, Clone)]
pub struct DuelConfig {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
    pub ticks: u32,
    pub stage: i32,
}

impl DuelConfig {
    /// Read `TANDEM_MODE`, `TANDEM_HOST`, `TANDEM_PORT`, `TANDEM_TICKS` and
    /// `TANDEM_STAGE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match lookup("TANDEM_MODE").as_deref() {
            Some("host") => Mode::Host,
            Some("client") => Mode::Client,
            other => return Err(ConfigError::Mode(other.unwrap_or_default().to_string())),
        };

        Ok(Self {
            mode,
            host: lookup("TANDEM_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: number(&lookup, "TANDEM_PORT", DEFAULT_PORT)?,
            ticks: number(&lookup, "TANDEM_TICKS", 1800)?,
            stage: number(&lookup, "TANDEM_STAGE", 1)?,
        })
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Number { name, value }),
    }
}
