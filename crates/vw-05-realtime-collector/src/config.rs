//! Collector tuning.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Sleep when the tip has not moved past the cursor.
    pub idle_poll: Duration,
    /// Sleep after a failed latest-height query.
    pub error_backoff: Duration,
    /// Minimum gap between two RPC-unreachable alerts.
    pub rpc_alert_debounce: Duration,
    /// No height progress for longer than this is a stall.
    pub stall_threshold: Duration,
    /// Refresh monikers after this many processed heights.
    pub refresh_every: u64,
    /// Rolling participation window, in blocks.
    pub window_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_secs(3),
            error_backoff: Duration::from_secs(10),
            rpc_alert_debounce: Duration::from_secs(10 * 60),
            stall_threshold: Duration::from_secs(2 * 60),
            refresh_every: 100,
            window_size: 100,
        }
    }
}

impl CollectorConfig {
    /// Short intervals for tests.
    pub fn for_testing() -> Self {
        Self {
            idle_poll: Duration::from_millis(10),
            error_backoff: Duration::from_millis(20),
            ..Self::default()
        }
    }
}
