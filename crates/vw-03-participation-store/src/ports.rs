//! Driven ports implemented by the store adapter.
//!
//! Production: [`SqliteStore`](crate::SqliteStore) (file-backed)
//! Testing: `SqliteStore::open_in_memory()`

use crate::domain::aggregates::{
    AlertLogEntry, HeightRange, ValidatorCount, ValidatorRate, ValidatorShare, WriteReport,
};
use crate::domain::period::DateRange;
use crate::error::StoreResult;
use chrono::NaiveDate;
use shared_types::{Height, ParticipationRecord, ScheduleEntry};

/// Participation rows and their aggregates.
pub trait ParticipationStore: Send + Sync {
    /// Idempotent upsert keyed by `(block_height, address)`.
    ///
    /// Split into bounded statements, each its own transaction. A failing
    /// statement aborts the rest of the batch.
    fn upsert_records(&self, records: &[ParticipationRecord]) -> StoreResult<WriteReport>;

    /// `MAX(block_height)`, `None` on an empty store.
    fn last_stored_height(&self) -> StoreResult<Option<Height>>;

    /// Rows stored for one height, ordered by address.
    fn records_at(&self, height: Height) -> StoreResult<Vec<ParticipationRecord>>;

    /// `MIN`/`MAX` height recorded on `date`.
    fn height_range(&self, date: NaiveDate) -> StoreResult<Option<HeightRange>>;

    /// Per-validator rate on `date`.
    fn participation_rates(&self, date: NaiveDate) -> StoreResult<Vec<ValidatorRate>> {
        self.period_rates(DateRange::day(date))
    }

    /// Per-validator count of non-participation on `date`, including zeros.
    fn missed_counts(&self, date: NaiveDate) -> StoreResult<Vec<ValidatorCount>> {
        self.missing_blocks(DateRange::day(date))
    }

    /// Per-validator rate across a date range.
    fn period_rates(&self, range: DateRange) -> StoreResult<Vec<ValidatorRate>>;

    /// Per-validator count of non-participation across a date range.
    fn missing_blocks(&self, range: DateRange) -> StoreResult<Vec<ValidatorCount>>;

    /// Each validator's share (percent) of all tx contributions in range.
    fn tx_contribution(&self, range: DateRange) -> StoreResult<Vec<ValidatorShare>>;

    /// Participation percent over the last `window` stored heights.
    fn uptime(&self, window: u64) -> StoreResult<Vec<ValidatorShare>>;

    /// Delete rows dated strictly before `cutoff`; returns rows removed.
    fn prune_before(&self, cutoff: NaiveDate) -> StoreResult<usize>;
}

/// Append-once alert history.
pub trait AlertLogStore: Send + Sync {
    /// Returns `false` when an entry with the same key already exists.
    fn record_alert(&self, entry: &AlertLogEntry) -> StoreResult<bool>;

    /// Latest entries first.
    fn recent_alerts(&self, limit: usize) -> StoreResult<Vec<AlertLogEntry>>;
}

/// Per-user daily report schedule.
pub trait ScheduleStore: Send + Sync {
    fn save_schedule(&self, entry: &ScheduleEntry) -> StoreResult<()>;

    fn schedule_for(&self, user_id: &str) -> StoreResult<Option<ScheduleEntry>>;

    fn list_schedules(&self) -> StoreResult<Vec<ScheduleEntry>>;

    /// Returns whether an entry was removed.
    fn delete_schedule(&self, user_id: &str) -> StoreResult<bool>;
}
