//! Driver metrics.

use std::time::Duration;

/// Sink for order-driver observations.
pub trait SwapMetrics: Send + Sync {
    /// An order was created.
    fn record_order_created(&self);
    /// An order moved between states.
    fn record_transition(&self, from: &str, to: &str);
    /// One protocol stage took `elapsed`.
    fn record_latency(&self, stage: &'static str, elapsed: Duration);
    /// The driver funded a source-leg escrow.
    fn record_escrow_funded(&self);
    /// The driver settled an escrow through the hashlock.
    fn record_escrow_withdrawn(&self);
    /// The driver cancelled an escrow after its deadline.
    fn record_escrow_cancelled(&self);
}

/// Discards every observation.
#[derive(Default, Debug, Clone)]
pub struct NoopMetrics;

impl SwapMetrics for NoopMetrics {
    fn record_order_created(&self) {}
    fn record_transition(&self, _from: &str, _to: &str) {}
    fn record_latency(&self, _stage: &'static str, _elapsed: Duration) {}
    fn record_escrow_funded(&self) {}
    fn record_escrow_withdrawn(&self) {}
    fn record_escrow_cancelled(&self) {}
}

/// Publishes observations to the global Prometheus registry.
#[derive(Default, Debug, Clone)]
pub struct PrometheusMetrics;

impl SwapMetrics for PrometheusMetrics {
    fn record_order_created(&self) {
        veil_telemetry::ORDERS_CREATED.inc();
        veil_telemetry::ORDERS_IN_FLIGHT.inc();
    }

    fn record_transition(&self, from: &str, to: &str) {
        veil_telemetry::ORDER_TRANSITIONS
            .with_label_values(&[from, to])
            .inc();
        if to == "Completed" || to == "Refunded" {
            veil_telemetry::ORDERS_IN_FLIGHT.dec();
        }
    }

    fn record_latency(&self, stage: &'static str, elapsed: Duration) {
        veil_telemetry::STEP_DURATION
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
    }

    fn record_escrow_funded(&self) {
        veil_telemetry::ESCROWS_FUNDED.inc();
    }

    fn record_escrow_withdrawn(&self) {
        veil_telemetry::ESCROWS_WITHDRAWN.inc();
    }

    fn record_escrow_cancelled(&self) {
        veil_telemetry::ESCROWS_CANCELLED.inc();
    }
}
