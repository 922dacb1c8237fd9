//! Broadcast transport for in-process subscribers.
//!
//! Uses tokio::sync::broadcast so every connected subscriber receives every
//! batch. Subscribers that fall behind skip the oldest batches instead of
//! slowing the pump down.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use super::{DeliveryError, NotificationTransport};
use crate::message::NotificationMessage;

/// A delivered batch, shared between all subscribers.
pub type Batch = Arc<[NotificationMessage]>;

/// Transport that fans each batch out to all current subscribers.
#[derive(Clone)]
pub struct BroadcastTransport {
    sender: Sender<Batch>,
}

impl BroadcastTransport {
    /// Create a new broadcast transport with the given capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of buffered batches.
    ///   Older batches are dropped if subscribers fall behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Connect a new subscriber.
    ///
    /// The subscriber receives every batch delivered after this call.
    pub fn subscribe(&self) -> Subscriber {
        Subscriber {
            rx: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Get the number of connected subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl NotificationTransport for BroadcastTransport {
    async fn deliver(&self, batch: &[NotificationMessage]) -> Result<(), DeliveryError> {
        let batch: Batch = Arc::from(batch);
        let size = batch.len();

        // send() only fails when nobody is listening, which is not a delivery failure
        match self.sender.send(batch) {
            Ok(receivers) => {
                tracing::debug!(receivers, batch_size = size, "Batch broadcast");
            }
            Err(_) => {
                tracing::debug!(batch_size = size, "No subscribers connected, batch discarded");
            }
        }
        Ok(())
    }
}

/// A connected subscriber of a [`BroadcastTransport`].
pub struct Subscriber {
    rx: Receiver<Batch>,
    /// Batches skipped because this subscriber fell behind.
    missed: u64,
}

impl Subscriber {
    /// Wait for the next batch, returning None once the transport is dropped.
    ///
    /// Lagged batches are skipped and counted in [`Subscriber::missed`].
    pub async fn next_batch(&mut self) -> Option<Batch> {
        loop {
            match self.rx.recv().await {
                Ok(batch) => return Some(batch),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Subscriber lagged, skipping batches");
                    self.missed += skipped;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Get the number of batches skipped due to lag.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Convert into a stream of batches, skipping lagged ones.
    pub fn into_stream(self) -> impl Stream<Item = Batch> + Send + 'static {
        BroadcastStream::new(self.rx).filter_map(|result| match result {
            Ok(batch) => Some(batch),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Subscriber stream lagged, skipping batches");
                None
            }
        })
    }
}
