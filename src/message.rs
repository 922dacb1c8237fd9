//! Notification message model.
//!
//! The pump never inspects message contents; these fields exist for the
//! sources and transports shipped with the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{generate_message_id, now_millis};

/// Severity attached to a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// One notification to deliver to subscribers.
///
/// Treated as an immutable value once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// UUIDv7 identifier, sortable by creation time
    pub id: String,
    /// Human-readable content
    pub text: String,
    pub severity: Severity,
    /// Creation time in Unix milliseconds
    pub timestamp: i64,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl NotificationMessage {
    /// Create an informational message stamped with a fresh ID and the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            text: text.into(),
            severity: Severity::Info,
            timestamp: now_millis(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
