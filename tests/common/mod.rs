//! Test utilities for Spout integration tests.
//!
//! Provides:
//! - A scripted source replaying fixed batches and failures
//! - A recording transport that can fail or stall on demand
//! - A polling `wait_for` helper that works under paused time

#![allow(dead_code)]

use async_trait::async_trait;
use spout::source::{NotificationSource, SourceError};
use spout::transport::{DeliveryError, NotificationTransport};
use spout::NotificationMessage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One scripted poll result.
pub enum Step {
    Batch(Vec<&'static str>),
    Fail(&'static str),
}

/// Shorthand for a batch step.
pub fn batch(texts: &[&'static str]) -> Step {
    Step::Batch(texts.to_vec())
}

/// Source replaying scripted steps, then returning empty batches.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    polls: AtomicUsize,
    cancel_when_exhausted: Option<CancellationToken>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            polls: AtomicUsize::new(0),
            cancel_when_exhausted: None,
        }
    }

    /// Cancel `token` on the first poll after the script runs out.
    pub fn cancel_when_exhausted(mut self, token: CancellationToken) -> Self {
        self.cancel_when_exhausted = Some(token);
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSource for ScriptedSource {
    async fn pending(&self) -> Result<Vec<NotificationMessage>, SourceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Batch(texts)) => Ok(texts.into_iter().map(NotificationMessage::new).collect()),
            Some(Step::Fail(reason)) => Err(SourceError::Unavailable(reason.to_string())),
            None => {
                if let Some(token) = &self.cancel_when_exhausted {
                    token.cancel();
                }
                Ok(Vec::new())
            }
        }
    }
}

/// Transport recording the texts of every successfully delivered batch.
#[derive(Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<Vec<String>>>,
    attempts: AtomicUsize,
    /// 1-based attempt numbers that fail
    fail_on: Vec<usize>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given 1-based delivery attempts.
    pub fn failing_on(attempts: &[usize]) -> Self {
        Self {
            fail_on: attempts.to_vec(),
            ..Self::default()
        }
    }

    /// Take `delay` to complete every delivery.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<Vec<String>> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn deliver(&self, batch: &[NotificationMessage]) -> Result<(), DeliveryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.contains(&attempt) {
            return Err(DeliveryError::Rejected(format!("attempt {attempt} refused")));
        }

        let texts = batch.iter().map(|m| m.text.clone()).collect();
        self.delivered.lock().unwrap().push(texts);
        Ok(())
    }
}

/// Convert expected batches into the recorded shape.
pub fn texts(batches: &[&[&str]]) -> Vec<Vec<String>> {
    batches
        .iter()
        .map(|b| b.iter().map(|t| t.to_string()).collect())
        .collect()
}

/// Wait for a condition to become true with timeout.
///
/// Uses tokio's clock, so it also works in `start_paused` tests.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
