//! RPC-error alert debouncing.

use std::time::Duration;
use tokio::time::Instant;

/// Allows one RPC-unreachable alert per `interval` during an outage.
/// A successful call re-arms it.
#[derive(Debug)]
pub struct RpcErrorDebouncer {
    interval: Duration,
    last_alert: Option<Instant>,
}

impl RpcErrorDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_alert: None,
        }
    }

    /// Record an error at `now`; returns whether to alert.
    pub fn on_error(&mut self, now: Instant) -> bool {
        let due = self
            .last_alert
            .map_or(true, |at| now.saturating_duration_since(at) > self.interval);
        if due {
            self.last_alert = Some(now);
        }
        due
    }

    pub fn on_success(&mut self) {
        self.last_alert = None;
    }
}
