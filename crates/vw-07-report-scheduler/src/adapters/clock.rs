//! Clock adapters.

use crate::ports::TimeSource;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// System wall clock.
#[derive(Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock driven by the tokio clock: `base` plus the tokio time elapsed
/// since construction. Under a paused runtime it moves only with
/// `tokio::time::advance` or auto-advance.
#[derive(Debug)]
pub struct InstantClock {
    base: DateTime<Utc>,
    started: Instant,
}

impl InstantClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            started: Instant::now(),
        }
    }
}

impl TimeSource for InstantClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap_or_default();
        self.base + elapsed
    }
}
