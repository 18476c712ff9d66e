//! # Monitor Configuration
//!
//! Loaded from a TOML file, then overridden by environment variables. Every
//! field has a default, so a missing file or an empty section is valid.
//!
//! ```toml
//! [rpc]
//! endpoint = "https://rpc.test5.gno.land:443"
//! request_timeout_secs = 15
//!
//! [store]
//! path = "./db/participation.db"
//! retention_days = 90
//!
//! [backfill]
//! strategy = "parallel"
//! workers = 20
//!
//! [reports]
//! default_timezone = "Europe/Paris"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use vw_01_block_source::{RetryPolicy, RpcConfig};
use vw_05_realtime_collector::CollectorConfig;
use vw_06_backfill::{BackfillConfig, Strategy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcSection {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Attempts for the active validator-set fetch.
    pub retry_attempts: u32,
    /// First retry delay; doubles on each attempt.
    pub retry_base_delay_secs: u64,
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:26657".to_string(),
            request_timeout_secs: 15,
            connect_timeout_secs: 10,
            retry_attempts: 3,
            retry_base_delay_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: PathBuf,
    pub max_bind_params: usize,
    /// Rows older than this many days are pruned daily. 0 keeps everything.
    pub retention_days: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./db/participation.db"),
            max_bind_params: 990,
            retention_days: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorSection {
    pub idle_poll_secs: u64,
    pub error_backoff_secs: u64,
    pub rpc_alert_debounce_secs: u64,
    pub stall_threshold_secs: u64,
    /// Refresh monikers every N processed heights.
    pub refresh_every: u64,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            idle_poll_secs: 3,
            error_backoff_secs: 10,
            rpc_alert_debounce_secs: 600,
            stall_threshold_secs: 120,
            refresh_every: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    /// Rolling participation window, in blocks.
    pub window_size: usize,
    pub missed_poll_secs: u64,
}

impl Default for AlertsSection {
    fn default() -> Self {
        Self {
            window_size: 100,
            missed_poll_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    pub refresh_interval_secs: u64,
    /// Read genesis validators from this file instead of the RPC.
    pub genesis_file: Option<PathBuf>,
    pub valopers_realm: Option<String>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            genesis_file: None,
            valopers_realm: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackfillSection {
    /// `sequential` or `parallel`.
    pub strategy: String,
    pub workers: usize,
    pub queue_capacity: usize,
    pub sequential_flush: usize,
    pub parallel_flush: usize,
    pub chunk_heights: u64,
}

impl Default for BackfillSection {
    fn default() -> Self {
        let defaults = BackfillConfig::default();
        Self {
            strategy: defaults.strategy.to_string(),
            workers: defaults.workers,
            queue_capacity: defaults.queue_capacity,
            sequential_flush: defaults.sequential_flush,
            parallel_flush: defaults.parallel_flush,
            chunk_heights: defaults.chunk_heights,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsSection {
    pub enabled: bool,
    pub default_hour: u32,
    pub default_minute: u32,
    pub default_timezone: String,
    /// Rates at or above this are marked healthy.
    pub low_rate_threshold: f64,
}

impl Default for ReportsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            default_hour: 9,
            default_minute: 0,
            default_timezone: "Europe/Paris".to_string(),
            low_rate_threshold: 95.0,
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub rpc: RpcSection,
    pub store: StoreSection,
    pub collector: CollectorSection,
    pub alerts: AlertsSection,
    pub resolver: ResolverSection,
    pub backfill: BackfillSection,
    pub reports: ReportsSection,
}

impl MonitorConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Apply `VW_RPC_ENDPOINT`, `VW_DB_PATH` and `VW_WINDOW_SIZE`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(endpoint) = lookup("VW_RPC_ENDPOINT") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(path) = lookup("VW_DB_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(size) = lookup("VW_WINDOW_SIZE") {
            self.alerts.window_size =
                size.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        name: "VW_WINDOW_SIZE",
                        value: size.clone(),
                    })?;
        }
        Ok(())
    }

    /// File then process environment.
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            endpoint: self.rpc.endpoint.clone(),
            request_timeout: Duration::from_secs(self.rpc.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.rpc.connect_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.rpc.retry_attempts,
            Duration::from_secs(self.rpc.retry_base_delay_secs),
        )
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            idle_poll: Duration::from_secs(self.collector.idle_poll_secs),
            error_backoff: Duration::from_secs(self.collector.error_backoff_secs),
            rpc_alert_debounce: Duration::from_secs(self.collector.rpc_alert_debounce_secs),
            stall_threshold: Duration::from_secs(self.collector.stall_threshold_secs),
            refresh_every: self.collector.refresh_every.max(1),
            window_size: self.alerts.window_size.max(1),
        }
    }

    /// Unknown strategy names fall back to sequential.
    pub fn backfill_config(&self) -> BackfillConfig {
        let strategy = self.backfill.strategy.parse::<Strategy>().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to sequential backfill");
            Strategy::Sequential
        });
        BackfillConfig {
            strategy,
            workers: self.backfill.workers.max(1),
            queue_capacity: self.backfill.queue_capacity.max(1),
            sequential_flush: self.backfill.sequential_flush,
            parallel_flush: self.backfill.parallel_flush,
            chunk_heights: self.backfill.chunk_heights,
        }
    }
}
