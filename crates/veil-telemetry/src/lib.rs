//! # Veil Telemetry
//!
//! Structured logging and Prometheus metrics for Veilswap.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use veil_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VEIL_SERVICE_NAME` | `veilswap` | Service name in logs |
//! | `VEIL_LOG_LEVEL` | `info` | Log level filter |
//! | `VEIL_JSON_LOGS` | `false` | JSON formatted logs |
//! | `VEIL_METRICS_PORT` | `9300` | Prometheus metrics port |

#![warn(missing_docs)]

mod config;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, ESCROWS_CANCELLED,
    ESCROWS_FUNDED, ESCROWS_WITHDRAWN, ORDERS_CREATED, ORDERS_IN_FLIGHT, ORDER_TRANSITIONS,
    REGISTRY, STEP_DURATION, WALLET_CALLS,
};

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Guard that keeps telemetry active. Drop on shutdown.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let filter = parse_filter(&config.log_level)?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        "telemetry initialized"
    );
    Ok(TelemetryGuard { _metrics: metrics })
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::Config(e.to_string()))
}
