//! # vw-telemetry
//!
//! Logging and metrics setup shared by the monitor binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vw_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VW_SERVICE_NAME` | `validator-watch` | Service name on every log line |
//! | `VW_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `VW_JSON_LOGS` | `true` in containers | JSON instead of pretty output |
//! | `VW_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |
//! | `VW_NETWORK` | `test5` | Network label |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, publish_validator_gauges, register_metrics, MetricsHandle,
    BACKFILL_ROWS_WRITTEN, CHAIN_LATEST_HEIGHT, COLLECTOR_CURSOR_HEIGHT,
    VALIDATOR_MISSED_BLOCKS_TODAY, VALIDATOR_PARTICIPATION_RATE,
};
pub use tracing_setup::init_logging;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
///
/// Hold the guard for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(TelemetryGuard { _metrics: metrics })
}

pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
