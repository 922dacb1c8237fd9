//! Heartbeat source.
//!
//! Emits exactly one numbered message per poll, which makes the pump's
//! cadence visible to subscribers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{NotificationSource, SourceError};
use crate::message::NotificationMessage;

/// Source yielding a single heartbeat message on every poll.
#[derive(Debug)]
pub struct HeartbeatSource {
    label: String,
    beats: AtomicU64,
}

impl HeartbeatSource {
    /// Create a heartbeat source whose messages read `"{label} #{n}"`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            beats: AtomicU64::new(0),
        }
    }

    /// Get the number of heartbeats emitted so far.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

impl Default for HeartbeatSource {
    fn default() -> Self {
        Self::new("heartbeat")
    }
}

#[async_trait]
impl NotificationSource for HeartbeatSource {
    async fn pending(&self) -> Result<Vec<NotificationMessage>, SourceError> {
        let beat = self.beats.fetch_add(1, Ordering::SeqCst) + 1;
        let message = NotificationMessage::new(format!("{} #{}", self.label, beat))
            .with_attribute("beat", beat.to_string());
        Ok(vec![message])
    }
}
