//! Telemetry configuration from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or full EnvFilter syntax)
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON instead of pretty logs
    pub json_logs: bool,

    /// Network label (e.g. test5, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "validator-watch".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "test5".to_string(),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

impl TelemetryConfig {
    /// Read `VW_*` variables; anything unset keeps its default.
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("VW_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("VW_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("VW_CONSOLE_OUTPUT")
                .map(|v| flag(&v))
                .unwrap_or(true),

            json_logs: env::var("VW_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(is_container),

            network: env::var("VW_NETWORK").unwrap_or(defaults.network),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "validator-watch");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_flag_values() {
        assert!(flag("TRUE"));
        assert!(flag(" 1 "));
        assert!(!flag("false"));
        assert!(!flag("0"));
    }
}
