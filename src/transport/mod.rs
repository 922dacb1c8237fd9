//! Delivery transports for notification batches.
//!
//! Provides:
//! - The [`NotificationTransport`] capability
//! - Broadcast fan-out to in-process subscribers
//! - JSON lines output to any async writer

pub mod broadcast;
pub mod json_lines;

pub use broadcast::{Batch, BroadcastTransport, Subscriber};
pub use json_lines::JsonLinesTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::NotificationMessage;

/// Error raised when a transport cannot deliver a batch.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The receiving side refused the batch.
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Any other failure from a transport implementation.
    #[error("Transport error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A capability that delivers a batch to all currently connected subscribers.
///
/// The connector only calls `deliver` with a non-empty batch and awaits it
/// before scheduling the next tick. Retrying or dropping on failure is the
/// transport's own concern; an error returned here reaches the connector.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver the batch, preserving its order.
    async fn deliver(&self, batch: &[NotificationMessage]) -> Result<(), DeliveryError>;
}
