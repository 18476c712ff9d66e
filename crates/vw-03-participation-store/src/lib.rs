//! # vw-03-participation-store
//!
//! Durable table of one row per (block height, validator address), plus the
//! alert log and per-user report schedules.
//!
//! ## Overview
//!
//! - **`ParticipationStore`**: idempotent upsert keyed by `(block_height, addr)`
//!   and the aggregate queries used by the collector, alerting, reporting and
//!   metrics.
//! - **`AlertLogStore`**: append-once alert history.
//! - **`ScheduleStore`**: per-user `(hour, minute, timezone)` triples.
//! - **`SqliteStore`**: the single adapter implementing all three.
//!
//! ## Chunked Upsert
//!
//! SQLite bounds the number of bound parameters per statement. A batch of
//! `n` rows with 6 columns each is split into `ceil(n / max_rows)` statements
//! where `max_rows = max_bind_params / 6`; every statement runs in its own
//! transaction:
//!
//! ```text
//! rows: [0 ............................................ n)
//!        └─ tx 1: 165 rows ─┘└─ tx 2: 165 rows ─┘ ... └─ tx k ─┘
//!          INSERT ... ON CONFLICT(block_height, addr) DO UPDATE
//! ```
//!
//! A failing chunk aborts the batch; earlier chunks stay committed, which is
//! safe because re-running the same rows is an overwrite.
//!
//! ## Concurrency
//!
//! The connection sits behind a mutex, so writes are serialized. The
//! real-time collector and a backfill must not be run against overlapping
//! height ranges at the same time; nothing here enforces that.

pub mod adapters;
pub mod blocking;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::sqlite::SqliteStore;
pub use blocking::on_blocking_pool;
pub use domain::aggregates::{
    AlertLogEntry, HeightRange, ValidatorCount, ValidatorRate, ValidatorShare, WriteReport,
};
pub use domain::chunking::{chunk_bounds, max_rows_per_statement, COLUMNS_PER_ROW};
pub use domain::period::{DateRange, Period};
pub use error::{StoreError, StoreResult};
pub use ports::{AlertLogStore, ParticipationStore, ScheduleStore};
