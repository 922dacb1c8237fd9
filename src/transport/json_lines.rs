//! JSON lines transport.
//!
//! Writes each message of a batch as one JSON object per line and flushes once
//! the whole batch is written.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use super::{DeliveryError, NotificationTransport};
use crate::message::NotificationMessage;

/// Transport writing JSON lines to an async writer.
pub struct JsonLinesTransport<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the transport, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesTransport<Stdout> {
    /// Create a transport writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> NotificationTransport for JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&self, batch: &[NotificationMessage]) -> Result<(), DeliveryError> {
        // Hold the lock for the whole batch so concurrent callers never interleave lines
        let mut writer = self.writer.lock().await;

        for message in batch {
            let mut line = serde_json::to_vec(message)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
        }
        writer.flush().await?;
        Ok(())
    }
}
