//! # vw-06-backfill
//!
//! Populates participation rows for a closed height range `[from + 1, to]`,
//! typically a first run against months of history.
//!
//! ## Strategies
//!
//! | Strategy   | Fetch                       | Write                          |
//! |------------|-----------------------------|--------------------------------|
//! | Sequential | one height at a time        | every `sequential_flush` rows and at each chunk end |
//! | Parallel   | `workers` tasks, bounded job queue | single writer, every `parallel_flush` rows |
//!
//! Both strategies hand whole blocks to a [`RowBuffer`]; the flush decision
//! is taken only after all of a block's rows are queued, so one block's rows
//! are never split across two flushes. Each flush goes through
//! `ParticipationStore::upsert_records`, which splits it into bounded
//! statements.
//!
//! ## Failure semantics
//!
//! - A block that cannot be fetched is logged and dropped. Re-running the
//!   same range fills the gap; the upsert is idempotent.
//! - A store failure aborts the run. Rows committed by earlier flushes stay.
//!
//! The real-time collector must not be writing the same heights while a
//! backfill runs.

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::{BackfillConfig, Strategy};
pub use domain::{BackfillReport, RowBuffer};
pub use error::{BackfillError, BackfillResult};
pub use service::BackfillEngine;
