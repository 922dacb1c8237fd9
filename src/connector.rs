//! The notification pump.
//!
//! A [`NotificationConnector`] ties one source to one transport. Once started
//! it runs a single background task that repeats:
//!
//! 1. Poll the source for its pending batch
//! 2. Deliver the batch if it meets the minimum size, awaiting completion
//! 3. Wait the poll interval, aborting the wait as soon as cancellation is
//!    requested
//!
//! Cancellation is checked before every poll and raced against the wait. A
//! delivery already in flight always runs to completion.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::batch::BatchAccumulator;
use crate::config::ErrorPolicy;
use crate::message::NotificationMessage;
use crate::observability::metrics;
use crate::source::{NotificationSource, SourceError};
use crate::transport::{DeliveryError, NotificationTransport};

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Policy knobs for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Time waited after each tick before the next poll
    pub poll_interval: Duration,
    /// Smallest batch that triggers a delivery; smaller polls are held
    pub min_batch_size: usize,
    /// Whether a failed tick ends the pump or is logged and skipped
    pub error_policy: ErrorPolicy,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_batch_size: 1,
            error_policy: ErrorPolicy::Propagate,
        }
    }
}

impl ConnectorConfig {
    /// Check the policy values before a loop is started.
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.poll_interval.is_zero() {
            return Err(ConnectorError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        if self.min_batch_size == 0 {
            return Err(ConnectorError::InvalidConfig(
                "minimum batch size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    /// Constructed, not started
    Idle,
    /// Polling loop active
    Running,
    /// Cancellation observed or the loop failed
    Stopped,
}

/// Counters describing what a finished pump did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Number of times the source was asked for its pending batch
    pub polls: u64,
    /// Number of successful `deliver` calls
    pub deliveries: u64,
    /// Messages handed to the transport successfully
    pub delivered_messages: u64,
    /// Ticks that failed and were skipped under [`ErrorPolicy::Continue`]
    pub failed_ticks: u64,
    /// Messages in batches whose delivery failed
    pub dropped_messages: u64,
    /// Messages still held below the minimum batch size at shutdown
    pub undelivered_messages: u64,
}

/// Fault that ended the pump's task.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error("Source poll failed: {0}")]
    SourcePoll(#[from] SourceError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Pump task panicked")]
    TaskPanicked,

    #[error("Pump task was aborted")]
    TaskAborted,
}

/// Error returned when a connector cannot be started.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Connector already started")]
    AlreadyStarted,

    #[error("Invalid connector configuration: {0}")]
    InvalidConfig(String),
}

/// Polling pump moving notifications from a source to a transport.
pub struct NotificationConnector {
    source: Arc<dyn NotificationSource>,
    transport: Arc<dyn NotificationTransport>,
    config: ConnectorConfig,
    state: Arc<watch::Sender<ConnectorState>>,
}

impl NotificationConnector {
    /// Create an idle connector over the given capabilities.
    pub fn new(
        source: Arc<dyn NotificationSource>,
        transport: Arc<dyn NotificationTransport>,
        config: ConnectorConfig,
    ) -> Self {
        let (state, _) = watch::channel(ConnectorState::Idle);
        Self {
            source,
            transport,
            config,
            state: Arc::new(state),
        }
    }

    /// Start the polling loop under the caller's cancellation token.
    ///
    /// Returns immediately with a handle to the running task. A connector runs
    /// at most one loop; starting it again fails with
    /// [`ConnectorError::AlreadyStarted`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, token: CancellationToken) -> Result<ConnectorHandle, ConnectorError> {
        self.config.validate()?;

        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if *state == ConnectorState::Idle {
                *state = ConnectorState::Running;
                claimed = true;
            }
            claimed
        });
        if !claimed {
            return Err(ConnectorError::AlreadyStarted);
        }

        let pump = Pump {
            source: Arc::clone(&self.source),
            transport: Arc::clone(&self.transport),
            config: self.config,
            token: token.clone(),
            state: Arc::clone(&self.state),
            held: BatchAccumulator::new(self.config.min_batch_size),
            report: PumpReport::default(),
        };

        let task = tokio::spawn(pump.run().instrument(tracing::info_span!("notification_pump")));

        Ok(ConnectorHandle {
            task,
            token,
            state: Arc::clone(&self.state),
        })
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> ConnectorState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectorState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }
}

/// Handle to a running pump.
///
/// Dropping the handle detaches the task; it keeps running until its token is
/// cancelled.
pub struct ConnectorHandle {
    task: JoinHandle<Result<PumpReport, PumpError>>,
    token: CancellationToken,
    state: Arc<watch::Sender<ConnectorState>>,
}

impl ConnectorHandle {
    /// Wait for the pump to finish and return its outcome.
    pub async fn join(self) -> Result<PumpReport, PumpError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The loop never reached its own Stopped transition
                self.state.send_replace(ConnectorState::Stopped);
                if e.is_panic() {
                    Err(PumpError::TaskPanicked)
                } else {
                    Err(PumpError::TaskAborted)
                }
            }
        }
    }

    /// Request cancellation and wait for the pump to finish.
    pub async fn stop(self) -> Result<PumpReport, PumpError> {
        self.token.cancel();
        self.join().await
    }

    /// Check whether the pump's task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// The token this pump observes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

/// State owned exclusively by the running loop.
struct Pump {
    source: Arc<dyn NotificationSource>,
    transport: Arc<dyn NotificationTransport>,
    config: ConnectorConfig,
    token: CancellationToken,
    state: Arc<watch::Sender<ConnectorState>>,
    held: BatchAccumulator<NotificationMessage>,
    report: PumpReport,
}

impl Pump {
    async fn run(mut self) -> Result<PumpReport, PumpError> {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            min_batch_size = self.config.min_batch_size,
            error_policy = ?self.config.error_policy,
            "Notification pump started"
        );

        let result = self.poll_loop().await;

        let undelivered = self.held.len();
        if undelivered > 0 {
            tracing::warn!(undelivered, "Pump stopped with notifications below the minimum batch size");
        }
        self.report.undelivered_messages = undelivered as u64;
        self.state.send_replace(ConnectorState::Stopped);

        match result {
            Ok(()) => {
                tracing::info!(
                    polls = self.report.polls,
                    deliveries = self.report.deliveries,
                    delivered_messages = self.report.delivered_messages,
                    "Notification pump stopped"
                );
                Ok(self.report)
            }
            Err(e) => {
                tracing::error!(error = %e, polls = self.report.polls, "Notification pump failed");
                Err(e)
            }
        }
    }

    async fn poll_loop(&mut self) -> Result<(), PumpError> {
        loop {
            if self.token.is_cancelled() {
                tracing::debug!("Cancellation observed before poll");
                return Ok(());
            }

            if let Err(e) = self.tick().await {
                match self.config.error_policy {
                    ErrorPolicy::Propagate => return Err(e),
                    ErrorPolicy::Continue => {
                        self.report.failed_ticks += 1;
                        tracing::warn!(error = %e, "Tick failed, continuing");
                    }
                }
            }

            tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    tracing::debug!("Cancellation observed during wait");
                    return Ok(());
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Poll once and deliver whatever is ready.
    async fn tick(&mut self) -> Result<(), PumpError> {
        self.report.polls += 1;
        metrics::record_poll();

        let batch = match self.source.pending().await {
            Ok(batch) => batch,
            Err(e) => {
                metrics::record_tick_failure("poll");
                return Err(e.into());
            }
        };

        self.held.extend(batch);
        let Some(ready) = self.held.take_ready() else {
            return Ok(());
        };

        let size = ready.len();
        let started = Instant::now();

        match self.transport.deliver(&ready).await {
            Ok(()) => {
                self.report.deliveries += 1;
                self.report.delivered_messages += size as u64;
                metrics::record_delivery(size, started.elapsed().as_secs_f64());
                tracing::debug!(batch_size = size, "Batch delivered");
                Ok(())
            }
            Err(e) => {
                self.report.dropped_messages += size as u64;
                metrics::record_tick_failure("delivery");
                Err(e.into())
            }
        }
    }
}
