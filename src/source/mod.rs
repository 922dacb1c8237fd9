//! Notification sources polled by the connector.
//!
//! Provides:
//! - The [`NotificationSource`] capability
//! - An in-memory FIFO queue fed by producers
//! - A heartbeat source emitting one message per poll

pub mod heartbeat;
pub mod queue;

pub use heartbeat::HeartbeatSource;
pub use queue::QueueSource;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::NotificationMessage;

/// Error raised when a source cannot produce its pending batch.
///
/// "Nothing pending" is never an error; sources return an empty batch instead.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store could not be reached.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Any other failure from a source implementation.
    #[error("Source error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A capability that yields the currently pending notifications on demand.
///
/// Called once per tick, so implementations must return promptly. Marking
/// messages as consumed is the implementation's concern; the connector never
/// re-requests a batch or rolls back when delivery fails.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Return the pending batch in insertion order, possibly empty.
    async fn pending(&self) -> Result<Vec<NotificationMessage>, SourceError>;
}
