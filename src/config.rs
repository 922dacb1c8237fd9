//! Configuration parsing for the Spout host.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::connector::ConnectorConfig;

/// What the pump does when a tick fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    /// End the pump with the first source or delivery failure.
    #[default]
    Propagate,
    /// Log the failure, drop the affected batch and keep polling.
    Continue,
}

/// Which notification source the host polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// One synthetic message per tick
    #[default]
    Heartbeat,
    /// One message per line read from standard input
    Stdin,
}

/// Spout: a periodic notification pump with cooperative cancellation.
#[derive(Parser, Debug, Clone)]
#[command(name = "spout")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Time between polls, in milliseconds
    #[arg(long, env = "SPOUT_POLL_INTERVAL_MS", default_value_t = 5000)]
    pub poll_interval_ms: u64,

    /// Smallest batch that triggers a delivery
    #[arg(long, env = "SPOUT_MIN_BATCH_SIZE", default_value_t = 1)]
    pub min_batch_size: usize,

    /// Behavior when a poll or delivery fails
    #[arg(long, env = "SPOUT_ERROR_POLICY", value_enum, default_value_t = ErrorPolicy::Propagate)]
    pub error_policy: ErrorPolicy,

    /// Notification source to poll
    #[arg(long, env = "SPOUT_SOURCE", value_enum, default_value_t = SourceKind::Heartbeat)]
    pub source: SourceKind,

    /// Number of batches buffered for each subscriber
    #[arg(long, env = "SPOUT_SUBSCRIBER_CHANNEL_SIZE", default_value_t = 1024)]
    pub subscriber_channel_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connector policy derived from this configuration.
    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            min_batch_size: self.min_batch_size,
            error_policy: self.error_policy,
        }
    }

    /// Create a fast-ticking configuration for testing.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            poll_interval_ms: 10,
            log_level: "debug".into(),
            subscriber_channel_size: 16,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            min_batch_size: 1,
            error_policy: ErrorPolicy::Propagate,
            source: SourceKind::Heartbeat,
            subscriber_channel_size: 1024,
            log_level: "info".into(),
            otel_endpoint: None,
        }
    }
}
