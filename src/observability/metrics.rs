//! OpenTelemetry metrics for the pump.
//!
//! Key metrics:
//! - spout_polls_total: Counter for source polls
//! - spout_deliveries_total: Counter for successful deliveries
//! - spout_delivered_messages_total: Counter for delivered messages
//! - spout_tick_failures_total: Counter for failed polls or deliveries
//! - spout_delivery_latency_seconds: Histogram for transport latency

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Spout metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of source polls.
    pub polls_total: Counter<u64>,
    /// Total number of successful deliveries.
    pub deliveries_total: Counter<u64>,
    /// Total number of messages delivered.
    pub delivered_messages_total: Counter<u64>,
    /// Total number of failed ticks, labelled by stage.
    pub tick_failures_total: Counter<u64>,
    /// Histogram of delivery latency in seconds.
    pub delivery_latency: Histogram<f64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            polls_total: meter
                .u64_counter("spout_polls_total")
                .with_description("Total number of source polls")
                .with_unit("1")
                .init(),
            deliveries_total: meter
                .u64_counter("spout_deliveries_total")
                .with_description("Total number of batches delivered")
                .with_unit("1")
                .init(),
            delivered_messages_total: meter
                .u64_counter("spout_delivered_messages_total")
                .with_description("Total number of notifications delivered")
                .with_unit("1")
                .init(),
            tick_failures_total: meter
                .u64_counter("spout_tick_failures_total")
                .with_description("Polls or deliveries that returned an error")
                .with_unit("1")
                .init(),
            delivery_latency: meter
                .f64_histogram("spout_delivery_latency_seconds")
                .with_description("Time spent inside the transport per batch")
                .with_unit("s")
                .init(),
        }
    }

    /// Count one poll attempt.
    pub fn record_poll(&self) {
        self.polls_total.add(1, &[]);
    }

    /// Count a delivered batch and its latency.
    pub fn record_delivery(&self, batch_size: usize, latency_seconds: f64) {
        self.deliveries_total.add(1, &[]);
        self.delivered_messages_total.add(batch_size as u64, &[]);
        self.delivery_latency.record(latency_seconds, &[]);
    }

    /// Count a failed tick, labelled with the stage that failed.
    pub fn record_tick_failure(&self, stage: &'static str) {
        self.tick_failures_total.add(1, &[KeyValue::new("stage", stage)]);
    }
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
///
/// # Arguments
///
/// * `otel_endpoint` - Optional OTLP endpoint for metrics export
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, metrics stay local");
                    install_manual_reader();
                }
            }
        } else {
            install_manual_reader();
        }

        let meter = global::meter("spout");
        Metrics::new(&meter)
    });
}

/// Initialize the metrics system without OTLP export.
pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// Metrics are recorded but never exported.
fn install_manual_reader() {
    let reader = ManualReader::builder().build();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    global::set_meter_provider(provider);
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record a poll attempt, whether or not the source answered.
pub fn record_poll() {
    if let Some(m) = METRICS.get() {
        m.record_poll();
    }
}

/// Record a successful delivery.
pub fn record_delivery(batch_size: usize, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        m.record_delivery(batch_size, latency_seconds);
    }
}

/// Record a failed poll or delivery. `stage` is `"poll"` or `"delivery"`.
pub fn record_tick_failure(stage: &'static str) {
    if let Some(m) = METRICS.get() {
        m.record_tick_failure(stage);
    }
}
