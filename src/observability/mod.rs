//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing via tracing-subscriber
//! - OpenTelemetry metrics for polls and deliveries

pub mod metrics;
pub mod tracing;
