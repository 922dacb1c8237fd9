//! Spout: a periodic notification pump with cooperative cancellation.
//!
//! A [`connector::NotificationConnector`] polls a
//! [`source::NotificationSource`] on a fixed interval and hands every
//! qualifying batch to a [`transport::NotificationTransport`]. The host owns
//! the [`tokio_util::sync::CancellationToken`] that stops the pump.
//!
//! # Architecture
//!
//! - **Single loop**: one background task per connector, poll then deliver
//! - **Ordered**: batches are delivered in the order they were polled
//! - **Cancellable**: the inter-tick wait races the cancellation token
//! - **Observable**: structured tracing and OpenTelemetry metrics
//!
//! # Modules
//!
//! - [`batch`]: Minimum-size batch accumulator
//! - [`config`]: CLI and environment configuration
//! - [`connector`]: The polling pump and its state machine
//! - [`host`]: Demo host wiring a source and transport together
//! - [`message`]: Notification message model
//! - [`observability`]: Metrics and tracing setup
//! - [`source`]: Source capability and shipped sources
//! - [`transport`]: Transport capability and shipped transports

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // source::queue::QueueSource is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::struct_excessive_bools,     // Config structs may have flags
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod batch;
pub mod config;
pub mod connector;
pub mod host;
pub mod message;
pub mod observability;
pub mod source;
pub mod transport;

pub use connector::{ConnectorConfig, ConnectorHandle, ConnectorState, NotificationConnector};
pub use message::{NotificationMessage, Severity};
pub use source::NotificationSource;
pub use transport::NotificationTransport;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) notification ID.
///
/// # Example
///
/// ```
/// let id = spout::generate_message_id();
/// assert!(id.len() == 36); // UUID string format
/// ```
#[must_use]
pub fn generate_message_id() -> String {
    Uuid::now_v7().to_string()
}

/// Get the current Unix timestamp in milliseconds.
///
/// Clocks set before the Unix epoch report 0.
#[must_use]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
