//! Alert delivery and the periodic missed-block poller.

use crate::domain::missed::MissedBlockTracker;
use crate::error::NotifyResult;
use crate::ports::NotificationSink;
use chrono::{NaiveDate, Utc};
use shared_types::Notification;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use vw_03_participation_store::{on_blocking_pool, ParticipationStore};

/// Hand each notification to `sink`. Failures are logged and skipped.
///
/// Returns how many were delivered.
pub async fn dispatch<N>(sink: &N, notifications: &[Notification]) -> usize
where
    N: NotificationSink + ?Sized,
{
    let mut delivered = 0;
    for n in notifications {
        match sink.notify(n).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(
                kind = ?n.kind,
                address = n.address(),
                error = %e,
                "Notification delivery failed"
            ),
        }
    }
    delivered
}

/// Polls today's missed-block counts and raises threshold alerts.
pub struct MissedBlockWatcher<S, N>
where
    S: ParticipationStore,
    N: NotificationSink,
{
    store: Arc<S>,
    sink: Arc<N>,
    tracker: MissedBlockTracker,
}

impl<S, N> MissedBlockWatcher<S, N>
where
    S: ParticipationStore + 'static,
    N: NotificationSink,
{
    pub fn new(store: Arc<S>, sink: Arc<N>) -> Self {
        Self {
            store,
            sink,
            tracker: MissedBlockTracker::new(),
        }
    }

    /// Evaluate one day; returns the notifications emitted.
    pub async fn check(&mut self, date: NaiveDate) -> NotifyResult<Vec<Notification>> {
        let (counts, heights) = on_blocking_pool(&self.store, move |s| {
            Ok((s.missed_counts(date)?, s.height_range(date)?))
        })
        .await?;
        let alerts = self.tracker.evaluate(date, &counts, heights);

        if !alerts.is_empty() {
            debug!(date = %date, alerts = alerts.len(), "Missed-block alerts");
            dispatch(self.sink.as_ref(), &alerts).await;
        }
        Ok(alerts)
    }

    /// Check today's counts every `interval`, forever.
    pub async fn run(&mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(e) = self.check(today).await {
                warn!(error = %e, "Missed-block check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recording::RecordingSink;
    use shared_types::{Height, ParticipationRecord, Severity};
    use vw_03_participation_store::{
        DateRange, HeightRange, SqliteStore, StoreResult, ValidatorCount, ValidatorRate,
        ValidatorShare, WriteReport,
    };

    /// SQLite store whose missed-block aggregate holds the calling thread.
    struct SlowStore(SqliteStore);

    impl ParticipationStore for SlowStore {
        fn upsert_records(&self, records: &[ParticipationRecord]) -> StoreResult<WriteReport> {
            self.0.upsert_records(records)
        }
        fn last_stored_height(&self) -> StoreResult<Option<Height>> {
            self.0.last_stored_height()
        }
        fn records_at(&self, height: Height) -> StoreResult<Vec<ParticipationRecord>> {
            self.0.records_at(height)
        }
        fn height_range(&self, date: NaiveDate) -> StoreResult<Option<HeightRange>> {
            self.0.height_range(date)
        }
        fn period_rates(&self, range: DateRange) -> StoreResult<Vec<ValidatorRate>> {
            self.0.period_rates(range)
        }
        fn missing_blocks(&self, range: DateRange) -> StoreResult<Vec<ValidatorCount>> {
            std::thread::sleep(Duration::from_millis(300));
            self.0.missing_blocks(range)
        }
        fn tx_contribution(&self, range: DateRange) -> StoreResult<Vec<ValidatorShare>> {
            self.0.tx_contribution(range)
        }
        fn uptime(&self, window: u64) -> StoreResult<Vec<ValidatorShare>> {
            self.0.uptime(window)
        }
        fn prune_before(&self, cutoff: NaiveDate) -> StoreResult<usize> {
            self.0.prune_before(cutoff)
        }
    }

    fn seed(store: &SqliteStore, date: NaiveDate, address: &str, blocks: i64, missed: i64) {
        let rows: Vec<_> = (1..=blocks)
            .map(|h| ParticipationRecord {
                date,
                block_height: h,
                address: address.to_string(),
                moniker: address.to_uppercase(),
                participated: h > missed,
                tx_contribution: false,
            })
            .collect();
        store.upsert_records(&rows).unwrap();
    }

    #[tokio::test]
    async fn test_check_reads_store_and_notifies() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        for (i, missed) in [0, 1, 2, 3, 4].into_iter().enumerate() {
            seed(&store, date, &format!("g1v{i}"), 20, missed);
        }
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = MissedBlockWatcher::new(Arc::clone(&store), Arc::clone(&sink));

        let alerts = watcher.check(date).await.unwrap();
        let severities: Vec<_> = alerts.iter().map(|n| n.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Warning, Severity::Critical, Severity::Critical]
        );
        assert_eq!(sink.notifications().len(), 3);

        // Same counts on the next poll: nothing new.
        assert!(watcher.check(date).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_aggregate_does_not_stall_the_runtime() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let inner = SqliteStore::open_in_memory().unwrap();
        seed(&inner, date, "g1slow", 20, 1);
        let store = Arc::new(SlowStore(inner));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = MissedBlockWatcher::new(store, Arc::clone(&sink));

        let check = tokio::spawn(async move { watcher.check(date).await });
        // Single-threaded runtime: this timer only fires if the query left it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!check.is_finished());

        let alerts = check.await.unwrap().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(sink.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_survives_sink_failure() {
        let sink = RecordingSink::new();
        sink.set_failing(true);
        let n = crate::domain::messages::new_validator("g1new", "Newbie", 10);

        assert_eq!(dispatch(&sink, &[n.clone(), n]).await, 0);
        assert_eq!(sink.notifications().len(), 2);
    }
}
