//! Prometheus metrics.
//!
//! Registered once into [`REGISTRY`]. Exposition over HTTP is left to the
//! embedding process; [`encode_metrics`] renders the text format.

use lazy_static::lazy_static;
use prometheus::{Encoder, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Today's participation rate per validator, in percent
    pub static ref VALIDATOR_PARTICIPATION_RATE: GaugeVec = GaugeVec::new(
        Opts::new(
            "validator_participation_rate",
            "Validator participation rate for the current day (percent)"
        ),
        &["validator_address", "moniker"]
    ).expect("metric creation failed");

    /// Today's missed blocks per validator
    pub static ref VALIDATOR_MISSED_BLOCKS_TODAY: GaugeVec = GaugeVec::new(
        Opts::new(
            "validator_missed_blocks_today",
            "Blocks missed by the validator during the current day"
        ),
        &["validator_address", "moniker"]
    ).expect("metric creation failed");

    /// Last height processed by the real-time collector
    pub static ref COLLECTOR_CURSOR_HEIGHT: IntGauge = IntGauge::new(
        "collector_cursor_height",
        "Last block height processed by the real-time collector"
    ).expect("metric creation failed");

    /// Latest chain height observed
    pub static ref CHAIN_LATEST_HEIGHT: IntGauge = IntGauge::new(
        "chain_latest_height",
        "Latest block height reported by the RPC endpoint"
    ).expect("metric creation failed");

    /// Rows written by backfill runs
    pub static ref BACKFILL_ROWS_WRITTEN: IntCounter = IntCounter::new(
        "backfill_rows_written_total",
        "Participation rows written by backfill runs"
    ).expect("metric creation failed");
}

/// Keeps the registry alive.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register every metric. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(VALIDATOR_PARTICIPATION_RATE.clone()),
        Box::new(VALIDATOR_MISSED_BLOCKS_TODAY.clone()),
        Box::new(COLLECTOR_CURSOR_HEIGHT.clone()),
        Box::new(CHAIN_LATEST_HEIGHT.clone()),
        Box::new(BACKFILL_ROWS_WRITTEN.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Set both per-validator gauges, clearing validators no longer reported.
pub fn publish_validator_gauges<'a>(
    rates: impl IntoIterator<Item = (&'a str, &'a str, f64)>,
    missed: impl IntoIterator<Item = (&'a str, &'a str, u64)>,
) {
    VALIDATOR_PARTICIPATION_RATE.reset();
    VALIDATOR_MISSED_BLOCKS_TODAY.reset();
    for (address, moniker, rate) in rates {
        VALIDATOR_PARTICIPATION_RATE
            .with_label_values(&[address, moniker])
            .set(rate);
    }
    for (address, moniker, count) in missed {
        VALIDATOR_MISSED_BLOCKS_TODAY
            .with_label_values(&[address, moniker])
            .set(count as f64);
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
