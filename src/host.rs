//! Host wiring for the `spout` binary.
//!
//! Builds the configured source, a broadcast transport and a console
//! subscriber, then runs a connector until the shutdown token fires.

use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, SourceKind};
use crate::connector::{NotificationConnector, PumpReport};
use crate::source::{HeartbeatSource, NotificationSource, QueueSource};
use crate::transport::{
    BroadcastTransport, DeliveryError, JsonLinesTransport, NotificationTransport, Subscriber,
};

/// Forward every batch a subscriber receives to another transport.
///
/// Returns the number of batches forwarded once the broadcast side closes.
pub async fn forward(
    mut subscriber: Subscriber,
    sink: &dyn NotificationTransport,
) -> Result<u64, DeliveryError> {
    let mut forwarded = 0;
    while let Some(batch) = subscriber.next_batch().await {
        sink.deliver(&batch).await?;
        forwarded += 1;
    }
    if subscriber.missed() > 0 {
        tracing::warn!(missed = subscriber.missed(), "Console subscriber skipped batches");
    }
    Ok(forwarded)
}

/// Build the source selected by the configuration.
///
/// The stdin source reads lines on a detached thread until EOF. The thread is
/// never joined, so a blocked read cannot hold the process open at shutdown.
fn build_source(kind: SourceKind) -> std::io::Result<Arc<dyn NotificationSource>> {
    let source: Arc<dyn NotificationSource> = match kind {
        SourceKind::Heartbeat => Arc::new(HeartbeatSource::default()),
        SourceKind::Stdin => {
            let queue = QueueSource::new();
            let feeder = queue.clone();
            std::thread::Builder::new()
                .name("stdin-feeder".into())
                .spawn(move || match feeder.feed_lines(std::io::stdin().lock()) {
                    Ok(queued) => tracing::info!(queued, "Standard input closed"),
                    Err(e) => tracing::warn!(error = %e, "Failed to read standard input"),
                })?;
            Arc::new(queue)
        }
    };
    Ok(source)
}

/// Run the notification pump host.
///
/// # Arguments
///
/// * `config` - Host configuration
/// * `shutdown` - Token cancelled when the host should stop
///
/// # Returns
///
/// The pump's report once it has stopped and the console has drained.
pub async fn run_host(
    config: Config,
    shutdown: CancellationToken,
) -> Result<PumpReport, Box<dyn Error + Send + Sync>> {
    let connector_config = config.connector_config();
    connector_config.validate()?;

    let transport = Arc::new(BroadcastTransport::new(config.subscriber_channel_size));

    // Console subscriber printing delivered notifications as JSON lines
    let subscriber = transport.subscribe();
    let console = tokio::spawn(async move {
        let stdout = JsonLinesTransport::stdout();
        forward(subscriber, &stdout).await
    });

    let source = build_source(config.source)?;
    let connector = NotificationConnector::new(source, transport.clone(), connector_config);

    tracing::info!(
        source = ?config.source,
        poll_interval_ms = config.poll_interval_ms,
        "Starting notification pump"
    );

    let handle = connector.start(shutdown)?;
    let outcome = handle.join().await;

    // Dropping the last sender ends the console subscriber
    drop(connector);
    drop(transport);
    match console.await {
        Ok(Ok(forwarded)) => tracing::debug!(forwarded, "Console subscriber finished"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Console subscriber failed"),
        Err(e) => tracing::warn!(error = %e, "Console subscriber task failed"),
    }

    let report = outcome?;
    tracing::info!(?report, "Host stopped");
    Ok(report)
}
