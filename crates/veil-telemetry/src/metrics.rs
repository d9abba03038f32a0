//! Prometheus metrics for the escrow core and the order coordinator.
//!
//! All metrics follow the naming convention: `veil_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ESCROW METRICS
    // =========================================================================

    /// Total escrow legs funded
    pub static ref ESCROWS_FUNDED: Counter = Counter::new(
        "veil_escrow_funded_total",
        "Total number of escrow legs funded"
    ).expect("metric creation failed");

    /// Total escrow withdrawals
    pub static ref ESCROWS_WITHDRAWN: Counter = Counter::new(
        "veil_escrow_withdrawn_total",
        "Total number of escrow legs withdrawn through the hashlock"
    ).expect("metric creation failed");

    /// Total escrow cancellations
    pub static ref ESCROWS_CANCELLED: Counter = Counter::new(
        "veil_escrow_cancelled_total",
        "Total number of escrow legs cancelled after timeout"
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR METRICS
    // =========================================================================

    /// Total orders created
    pub static ref ORDERS_CREATED: Counter = Counter::new(
        "veil_coordinator_orders_created_total",
        "Total number of swap orders created"
    ).expect("metric creation failed");

    /// Orders currently in a non-terminal state
    pub static ref ORDERS_IN_FLIGHT: Gauge = Gauge::new(
        "veil_coordinator_orders_in_flight",
        "Number of orders not yet completed or refunded"
    ).expect("metric creation failed");

    /// Order state transitions
    pub static ref ORDER_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("veil_coordinator_order_transitions_total", "Order state transitions"),
        &["from", "to"]
    ).expect("metric creation failed");

    /// Step duration per order state
    pub static ref STEP_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "veil_coordinator_step_duration_seconds",
            "Time spent driving one protocol step"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("bucket creation failed")),
        &["state"]
    ).expect("metric creation failed");

    /// Counter-ledger wallet call outcomes
    pub static ref WALLET_CALLS: CounterVec = CounterVec::new(
        Opts::new("veil_coordinator_wallet_calls_total", "Counter-ledger wallet calls"),
        &["call", "outcome"]  // call: submit/confirm/proof, outcome: ok/retried/failed
    ).expect("metric creation failed");
}

/// Handle keeping the metrics registry alive.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ESCROWS_FUNDED.clone()),
        Box::new(ESCROWS_WITHDRAWN.clone()),
        Box::new(ESCROWS_CANCELLED.clone()),
        Box::new(ORDERS_CREATED.clone()),
        Box::new(ORDERS_IN_FLIGHT.clone()),
        Box::new(ORDER_TRANSITIONS.clone()),
        Box::new(STEP_DURATION.clone()),
        Box::new(WALLET_CALLS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &prometheus::Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
