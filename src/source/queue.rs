//! In-memory FIFO notification queue.
//!
//! Producers push messages from any task; each poll drains everything queued
//! so far. Messages are consumed on poll, before delivery is attempted.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::{Arc, Mutex, PoisonError};

use super::{NotificationSource, SourceError};
use crate::message::NotificationMessage;

/// Queue-backed source. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct QueueSource {
    queue: Arc<Mutex<VecDeque<NotificationMessage>>>,
}

impl QueueSource {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message for the next poll.
    pub fn push(&self, message: NotificationMessage) {
        self.lock().push_back(message);
    }

    /// Get the number of queued messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Enqueue one message per non-blank line until the reader hits EOF.
    ///
    /// Blocks the calling thread, so run it off the async runtime.
    /// Returns the number of messages queued.
    pub fn feed_lines<R: BufRead>(&self, reader: R) -> std::io::Result<usize> {
        let mut queued = 0;

        for line in reader.lines() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            self.push(NotificationMessage::new(text));
            queued += 1;
        }

        tracing::debug!(queued, "Line feed reached EOF");
        Ok(queued)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<NotificationMessage>> {
        // The queue holds plain values, so a poisoned lock is still consistent.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationSource for QueueSource {
    async fn pending(&self) -> Result<Vec<NotificationMessage>, SourceError> {
        Ok(self.lock().drain(..).collect())
    }
}
