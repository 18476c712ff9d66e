//! Driven ports.

use chrono::{DateTime, Utc};

/// Wall-clock source, injectable for tests.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
