//! Spout: a periodic notification pump with cooperative cancellation.
//!
//! # Usage
//!
//! ```bash
//! spout --poll-interval-ms 5000 --source heartbeat --log-level info
//! ```
//!
//! Environment variables can also be used:
//! - `SPOUT_POLL_INTERVAL_MS`: Time between polls
//! - `SPOUT_SOURCE`: Notification source (heartbeat, stdin)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! Delivered notifications are printed to stdout as JSON lines; logs go to
//! stderr.

use spout::config::Config;
use spout::host::run_host;
use spout::observability::metrics::init_metrics_with_endpoint;
use spout::observability::tracing::init_tracing;
use tokio_util::sync::CancellationToken;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Spout v{} - Notification Pump

  Configuration:
    Source:         {:?}
    Poll Interval:  {} ms
    Min Batch:      {}
    Error Policy:   {:?}
    Log Level:      {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.source,
        config.poll_interval_ms,
        config.min_batch_size,
        config.error_policy,
        config.log_level
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_tracing(&config.log_level);

    // Initialize metrics (with optional OTLP export)
    init_metrics_with_endpoint(config.otel_endpoint.as_deref());

    print_banner(&config);

    let shutdown = CancellationToken::new();

    // Spawn signal handler task
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating shutdown...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = ctrl_c.await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        signal_token.cancel();
    });

    run_host(config, shutdown).await?;

    tracing::info!("Spout shutdown complete");
    Ok(())
}
