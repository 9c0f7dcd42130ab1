//! Controller configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ControlError, Result};
use crate::transport::ConnectOptions;

/// Tunables shared by every controller operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Capacity of each per-node output queue (minimum 1)
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// Polling period while waiting for a capability to appear
    #[serde(default = "default_capability_poll_interval_ms")]
    pub capability_poll_interval_ms: u64,

    /// Polling period while waiting for trigger subscribers
    #[serde(default = "default_subscriber_poll_interval_ms")]
    pub subscriber_poll_interval_ms: u64,

    /// Dial timeout per node
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// TCP keepalive for node connections (0 = disabled)
    #[serde(default = "default_tcp_keepalive_secs")]
    pub tcp_keepalive_secs: u64,
}

fn default_stream_buffer() -> usize {
    1
}

fn default_capability_poll_interval_ms() -> u64 {
    1_000
}

fn default_subscriber_poll_interval_ms() -> u64 {
    5_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_tcp_keepalive_secs() -> u64 {
    30
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            stream_buffer: default_stream_buffer(),
            capability_poll_interval_ms: default_capability_poll_interval_ms(),
            subscriber_poll_interval_ms: default_subscriber_poll_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            tcp_keepalive_secs: default_tcp_keepalive_secs(),
        }
    }
}

impl ControllerConfig {
    /// Reject values that would make queues or tickers unusable
    pub fn validate(&self) -> Result<()> {
        if self.stream_buffer == 0 {
            return Err(ControlError::InvalidConfig(
                "stream_buffer must be at least 1".to_string(),
            ));
        }
        if self.capability_poll_interval_ms == 0 || self.subscriber_poll_interval_ms == 0 {
            return Err(ControlError::InvalidConfig(
                "poll intervals must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ControlError::InvalidConfig(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn capability_poll_interval(&self) -> Duration {
        Duration::from_millis(self.capability_poll_interval_ms)
    }

    pub fn subscriber_poll_interval(&self) -> Duration {
        Duration::from_millis(self.subscriber_poll_interval_ms)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            tcp_keepalive: (self.tcp_keepalive_secs > 0)
                .then(|| Duration::from_secs(self.tcp_keepalive_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intervals() {
        let config = ControllerConfig::default();
        assert_eq!(config.capability_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.subscriber_poll_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ControllerConfig {
            stream_buffer: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ControlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_keepalive_disabled_when_zero() {
        let config = ControllerConfig {
            tcp_keepalive_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.connect_options().tcp_keepalive, None);
        assert_eq!(
            config.connect_options().connect_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"stream_buffer": 8}"#).unwrap();
        assert_eq!(config.stream_buffer, 8);
        assert_eq!(config.subscriber_poll_interval_ms, 5_000);
    }
}
