//! SQLite adapter for the store ports.

use crate::domain::aggregates::{
    AlertLogEntry, HeightRange, ValidatorCount, ValidatorRate, ValidatorShare, WriteReport,
};
use crate::domain::chunking::{chunk_bounds, max_rows_per_statement, COLUMNS_PER_ROW};
use crate::domain::period::DateRange;
use crate::error::{StoreError, StoreResult};
use crate::ports::{AlertLogStore, ParticipationStore, ScheduleStore};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{Height, ParticipationRecord, ScheduleEntry};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// SQLite's historical `SQLITE_MAX_VARIABLE_NUMBER`.
pub const DEFAULT_MAX_BIND_PARAMS: usize = 990;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS daily_participations (
    date            TEXT    NOT NULL,
    block_height    INTEGER NOT NULL,
    moniker         TEXT    NOT NULL,
    addr            TEXT    NOT NULL,
    participated    INTEGER NOT NULL,
    tx_contribution INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (block_height, addr)
);
CREATE INDEX IF NOT EXISTS idx_dp_date ON daily_participations(date);
CREATE INDEX IF NOT EXISTS idx_dp_addr_date ON daily_participations(addr, date);

CREATE TABLE IF NOT EXISTS alert_logs (
    addr         TEXT    NOT NULL,
    moniker      TEXT    NOT NULL,
    level        TEXT    NOT NULL,
    start_height INTEGER NOT NULL,
    end_height   INTEGER NOT NULL,
    msg          TEXT    NOT NULL,
    sent_at      TEXT    NOT NULL,
    PRIMARY KEY (addr, level, start_height, end_height)
);

CREATE TABLE IF NOT EXISTS hour_reports (
    user_id             TEXT    PRIMARY KEY,
    daily_report_hour   INTEGER NOT NULL,
    daily_report_minute INTEGER NOT NULL,
    timezone            TEXT    NOT NULL DEFAULT 'Europe/Paris'
);
"#;

/// Single-connection SQLite store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_bind_params: usize,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`, including missing
    /// parent directories.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "Opened participation database");

        Self::with_connection(conn)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_bind_params: DEFAULT_MAX_BIND_PARAMS,
        })
    }

    /// Override the bound-parameter ceiling used to size upsert statements.
    pub fn with_max_bind_params(mut self, max_bind_params: usize) -> StoreResult<Self> {
        if max_bind_params < COLUMNS_PER_ROW {
            return Err(StoreError::BindLimitTooSmall(max_bind_params));
        }
        self.max_bind_params = max_bind_params;
        Ok(self)
    }

    pub fn max_bind_params(&self) -> usize {
        self.max_bind_params
    }

    /// Total participation rows.
    pub fn count_rows(&self) -> StoreResult<u64> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM daily_participations", [], |r| {
            r.get(0)
        })?;
        Ok(n as u64)
    }

    fn aggregate<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<T>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, map)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }
}

fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("date {raw:?}: {e}")))
}

fn upsert_sql(rows: usize) -> String {
    let placeholders = vec!["(?, ?, ?, ?, ?, ?)"; rows].join(", ");
    format!(
        "INSERT INTO daily_participations \
         (date, block_height, moniker, addr, participated, tx_contribution) \
         VALUES {placeholders} \
         ON CONFLICT(block_height, addr) DO UPDATE SET \
         date = excluded.date, \
         moniker = excluded.moniker, \
         participated = excluded.participated, \
         tx_contribution = excluded.tx_contribution"
    )
}

fn row_values(record: &ParticipationRecord) -> [Value; COLUMNS_PER_ROW] {
    [
        Value::Text(date_text(record.date)),
        Value::Integer(record.block_height),
        Value::Text(record.moniker.clone()),
        Value::Text(record.address.clone()),
        Value::Integer(i64::from(record.participated)),
        Value::Integer(i64::from(record.tx_contribution)),
    ]
}

fn write_chunk(conn: &mut Connection, rows: &[ParticipationRecord]) -> rusqlite::Result<()> {
    let sql = upsert_sql(rows.len());
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(rows.iter().flat_map(row_values)))?;
    }
    tx.commit()
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

const RATE_SQL: &str = "\
    SELECT addr, moniker, MAX(block_height), COUNT(*), SUM(participated) \
    FROM daily_participations \
    WHERE date >= ?1 AND date < ?2 \
    GROUP BY addr ORDER BY addr";

const MISSING_SQL: &str = "\
    SELECT addr, moniker, MAX(block_height), \
           SUM(CASE WHEN participated = 0 THEN 1 ELSE 0 END) \
    FROM daily_participations \
    WHERE date >= ?1 AND date < ?2 \
    GROUP BY addr ORDER BY addr";

const TX_SQL: &str = "\
    SELECT addr, moniker, MAX(block_height), SUM(tx_contribution) \
    FROM daily_participations \
    WHERE date >= ?1 AND date < ?2 \
    GROUP BY addr ORDER BY addr";

const UPTIME_SQL: &str = "\
    SELECT addr, moniker, MAX(block_height), COUNT(*), SUM(participated) \
    FROM daily_participations \
    WHERE block_height > (SELECT COALESCE(MAX(block_height), 0) FROM daily_participations) - ?1 \
    GROUP BY addr ORDER BY addr";

impl ParticipationStore for SqliteStore {
    fn upsert_records(&self, records: &[ParticipationRecord]) -> StoreResult<WriteReport> {
        let max_rows = max_rows_per_statement(self.max_bind_params);
        let bounds = chunk_bounds(records.len(), max_rows);
        let chunks = bounds.len();

        let mut conn = self.conn.lock();
        let mut report = WriteReport::default();
        for (index, range) in bounds.into_iter().enumerate() {
            let rows = &records[range];
            write_chunk(&mut conn, rows).map_err(|source| StoreError::ChunkFailed {
                chunk: index + 1,
                chunks,
                committed_rows: report.rows,
                source,
            })?;
            report.statements += 1;
            report.rows += rows.len();
        }

        if report.rows > 0 {
            debug!(
                rows = report.rows,
                statements = report.statements,
                "Upserted participation rows"
            );
        }
        Ok(report)
    }

    fn last_stored_height(&self) -> StoreResult<Option<Height>> {
        let conn = self.conn.lock();
        let height: Option<Height> = conn.query_row(
            "SELECT MAX(block_height) FROM daily_participations",
            [],
            |r| r.get(0),
        )?;
        Ok(height)
    }

    fn records_at(&self, height: Height) -> StoreResult<Vec<ParticipationRecord>> {
        let raw = self.aggregate(
            "SELECT date, block_height, moniker, addr, participated, tx_contribution \
             FROM daily_participations WHERE block_height = ?1 ORDER BY addr",
            params![height],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, Height>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, bool>(4)?,
                    r.get::<_, bool>(5)?,
                ))
            },
        )?;

        raw.into_iter()
            .map(
                |(date, block_height, moniker, address, participated, tx_contribution)| {
                    Ok(ParticipationRecord {
                        date: parse_date(&date)?,
                        block_height,
                        address,
                        moniker,
                        participated,
                        tx_contribution,
                    })
                },
            )
            .collect()
    }

    fn height_range(&self, date: NaiveDate) -> StoreResult<Option<HeightRange>> {
        let conn = self.conn.lock();
        let (min, max): (Option<Height>, Option<Height>) = conn.query_row(
            "SELECT MIN(block_height), MAX(block_height) FROM daily_participations WHERE date = ?1",
            params![date_text(date)],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(min.zip(max).map(|(min, max)| HeightRange { min, max }))
    }

    fn period_rates(&self, range: DateRange) -> StoreResult<Vec<ValidatorRate>> {
        self.aggregate(
            RATE_SQL,
            params![date_text(range.start), date_text(range.end)],
            |r| {
                Ok(ValidatorRate::new(
                    r.get(0)?,
                    r.get(1)?,
                    to_u64(r.get(3)?),
                    to_u64(r.get(4)?),
                ))
            },
        )
    }

    fn missing_blocks(&self, range: DateRange) -> StoreResult<Vec<ValidatorCount>> {
        self.aggregate(
            MISSING_SQL,
            params![date_text(range.start), date_text(range.end)],
            |r| {
                Ok(ValidatorCount {
                    address: r.get(0)?,
                    moniker: r.get(1)?,
                    count: to_u64(r.get(3)?),
                })
            },
        )
    }

    fn tx_contribution(&self, range: DateRange) -> StoreResult<Vec<ValidatorShare>> {
        let counts = self.aggregate(
            TX_SQL,
            params![date_text(range.start), date_text(range.end)],
            |r| {
                Ok(ValidatorCount {
                    address: r.get(0)?,
                    moniker: r.get(1)?,
                    count: to_u64(r.get(3)?),
                })
            },
        )?;

        let total: u64 = counts.iter().map(|c| c.count).sum();
        Ok(counts
            .into_iter()
            .map(|c| ValidatorShare {
                percent: if total == 0 {
                    0.0
                } else {
                    c.count as f64 * 100.0 / total as f64
                },
                address: c.address,
                moniker: c.moniker,
            })
            .collect())
    }

    fn uptime(&self, window: u64) -> StoreResult<Vec<ValidatorShare>> {
        let window = i64::try_from(window).unwrap_or(i64::MAX);
        self.aggregate(UPTIME_SQL, params![window], |r| {
            let rate = ValidatorRate::new(r.get(0)?, r.get(1)?, to_u64(r.get(3)?), to_u64(r.get(4)?));
            Ok(ValidatorShare {
                address: rate.address,
                moniker: rate.moniker,
                percent: rate.rate,
            })
        })
    }

    fn prune_before(&self, cutoff: NaiveDate) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM daily_participations WHERE date < ?1",
            params![date_text(cutoff)],
        )?;
        if removed > 0 {
            info!(removed, cutoff = %cutoff, "Pruned old participation rows");
        }
        Ok(removed)
    }
}

impl AlertLogStore for SqliteStore {
    fn record_alert(&self, entry: &AlertLogEntry) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO alert_logs (addr, moniker, level, start_height, end_height, msg, sent_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(addr, level, start_height, end_height) DO NOTHING",
            params![
                entry.address,
                entry.moniker,
                entry.level,
                entry.start_height,
                entry.end_height,
                entry.message,
                entry.sent_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn recent_alerts(&self, limit: usize) -> StoreResult<Vec<AlertLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.aggregate(
            "SELECT addr, moniker, level, start_height, end_height, msg, sent_at \
             FROM alert_logs ORDER BY sent_at DESC, rowid DESC LIMIT ?1",
            params![limit],
            |r| {
                Ok(AlertLogEntry {
                    address: r.get(0)?,
                    moniker: r.get(1)?,
                    level: r.get(2)?,
                    start_height: r.get(3)?,
                    end_height: r.get(4)?,
                    message: r.get(5)?,
                    sent_at: r.get(6)?,
                })
            },
        )
    }
}

fn schedule_from_row(r: &Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        user_id: r.get(0)?,
        hour: r.get(1)?,
        minute: r.get(2)?,
        timezone: r.get(3)?,
    })
}

impl ScheduleStore for SqliteStore {
    fn save_schedule(&self, entry: &ScheduleEntry) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO hour_reports (user_id, daily_report_hour, daily_report_minute, timezone) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id) DO UPDATE SET \
             daily_report_hour = excluded.daily_report_hour, \
             daily_report_minute = excluded.daily_report_minute, \
             timezone = excluded.timezone",
            params![entry.user_id, entry.hour, entry.minute, entry.timezone],
        )?;
        Ok(())
    }

    fn schedule_for(&self, user_id: &str) -> StoreResult<Option<ScheduleEntry>> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                "SELECT user_id, daily_report_hour, daily_report_minute, timezone \
                 FROM hour_reports WHERE user_id = ?1",
                params![user_id],
                schedule_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn list_schedules(&self) -> StoreResult<Vec<ScheduleEntry>> {
        self.aggregate(
            "SELECT user_id, daily_report_hour, daily_report_minute, timezone \
             FROM hour_reports ORDER BY user_id",
            [],
            schedule_from_row,
        )
    }

    fn delete_schedule(&self, user_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM hour_reports WHERE user_id = ?1", params![user_id])?;
        Ok(removed > 0)
    }
}
