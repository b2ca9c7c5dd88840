//! Session configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::core::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DISCONNECT_LINGER, DEFAULT_MAX_PAYLOAD_SIZE,
    DEFAULT_PROGRESS_LOG_INTERVAL,
};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interface the host listens on.
    pub bind_ip: IpAddr,

    /// How long a client keeps trying before giving up.
    pub connect_timeout: Duration,

    /// Interval between "still waiting" log lines.
    pub progress_log_interval: Duration,

    /// Largest payload accepted; bigger frames are discarded.
    pub max_payload_size: usize,

    /// How long `disconnect` waits for background tasks to finish.
    pub disconnect_linger: Duration,

    /// Worker threads of the session-owned runtime.
    pub runtime_threads: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            disconnect_linger: DEFAULT_DISCONNECT_LINGER,
            runtime_threads: 1,
        }
    }
}

/// Builder for creating a [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface the host listens on.
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.config.bind_ip = ip;
        self
    }

    /// Set the client connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the progress log interval.
    pub fn progress_log_interval(mut self, interval: Duration) -> Self {
        self.config.progress_log_interval = interval;
        self
    }

    /// Set the maximum accepted payload size.
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set how long `disconnect` waits for background tasks.
    pub fn disconnect_linger(mut self, linger: Duration) -> Self {
        self.config.disconnect_linger = linger;
        self
    }

    /// Set the runtime worker thread count (minimum 1).
    pub fn runtime_threads(mut self, threads: usize) -> Self {
        self.config.runtime_threads = threads.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(150));
        assert_eq!(config.progress_log_interval, Duration::from_secs(5));
        assert!(config.bind_ip.is_unspecified());
        assert_eq!(config.runtime_threads, 1);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfigBuilder::new()
            .bind_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .connect_timeout(Duration::from_secs(2))
            .max_payload_size(512)
            .runtime_threads(0)
            .build();

        assert_eq!(config.bind_ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.max_payload_size, 512);
        assert_eq!(config.runtime_threads, 1);
    }
}
