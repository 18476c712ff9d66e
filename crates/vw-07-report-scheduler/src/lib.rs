//! # vw-07-report-scheduler
//!
//! One timer loop per user. Each loop sleeps until the user's next local
//! `hh:mm`, sends yesterday's participation summary, and repeats.
//!
//! ## Exclusivity
//!
//! Loops are registered under a single mutex keyed by user id. Scheduling a
//! user that already has a loop closes the old loop's stop channel before the
//! replacement is spawned, so at most one loop per user is ever live.
//!
//! ## Time
//!
//! - Unknown timezones fall back to UTC (logged).
//! - A local time inside a DST gap fires at the first valid instant after
//!   the gap; inside a fold, at the earlier instant.
//! - A report whose query or delivery fails is logged and not retried until
//!   the next slot.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::clock::{InstantClock, SystemTimeSource};
pub use domain::report::{format_daily_report, LOW_RATE_THRESHOLD};
pub use domain::time::{next_occurrence, resolve_timezone, validate_time};
pub use error::{SchedulerError, SchedulerResult};
pub use ports::TimeSource;
pub use service::ReportScheduler;
