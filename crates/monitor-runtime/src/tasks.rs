//! Periodic background tasks owned by the runtime.
//!
//! Each `*_once` function does one pass and is what the tests drive; the
//! looping wrappers are what the supervisor runs.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use shared_types::Height;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};
use vw_02_moniker_resolver::{MonikerBook, MonikerResolverApi};
use vw_03_participation_store::{on_blocking_pool, ParticipationStore, StoreResult};
use vw_04_alerting::{dispatch, messages, NotificationSink};
use vw_05_realtime_collector::CollectorProgress;
use vw_telemetry::{publish_validator_gauges, CHAIN_LATEST_HEIGHT, COLLECTOR_CURSOR_HEIGHT};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Refresh the moniker map and announce validators that just became active.
/// Returns how many were announced.
pub async fn refresh_monikers_once<R, N>(
    resolver: &R,
    sink: &N,
    progress: &watch::Receiver<CollectorProgress>,
) -> usize
where
    R: MonikerResolverApi,
    N: NotificationSink,
{
    let outcome = match resolver.refresh().await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Moniker refresh failed, keeping previous map");
            return 0;
        }
    };
    debug!(
        total = outcome.total,
        added = outcome.added.len(),
        removed = outcome.removed.len(),
        "Moniker map refreshed"
    );

    let height: Height = progress.borrow().state.cursor().unwrap_or_default();
    let alerts: Vec<_> = outcome
        .added
        .iter()
        .map(|(address, moniker)| messages::new_validator(address, moniker, height))
        .collect();
    dispatch(sink, &alerts).await
}

pub async fn refresh_monikers<R, N>(
    resolver: Arc<R>,
    sink: Arc<N>,
    progress: watch::Receiver<CollectorProgress>,
    every: Duration,
) where
    R: MonikerResolverApi,
    N: NotificationSink,
{
    let mut ticker = ticker(every);
    loop {
        ticker.tick().await;
        refresh_monikers_once(resolver.as_ref(), sink.as_ref(), &progress).await;
    }
}

/// Push today's per-validator aggregates and the collector heights into the
/// Prometheus gauges.
pub async fn publish_metrics_once<S>(
    store: &Arc<S>,
    book: &MonikerBook,
    progress: &CollectorProgress,
    today: NaiveDate,
) -> StoreResult<()>
where
    S: ParticipationStore + 'static,
{
    let (rates, missed) = on_blocking_pool(store, move |s| {
        Ok((s.participation_rates(today)?, s.missed_counts(today)?))
    })
    .await?;

    let rate_labels: Vec<(String, String, f64)> = rates
        .into_iter()
        .map(|r| {
            let moniker = book.moniker_of(&r.address);
            (r.address, moniker, r.rate)
        })
        .collect();
    let missed_labels: Vec<(String, String, u64)> = missed
        .into_iter()
        .map(|c| {
            let moniker = book.moniker_of(&c.address);
            (c.address, moniker, c.count)
        })
        .collect();

    publish_validator_gauges(
        rate_labels
            .iter()
            .map(|(a, m, r)| (a.as_str(), m.as_str(), *r)),
        missed_labels
            .iter()
            .map(|(a, m, c)| (a.as_str(), m.as_str(), *c)),
    );

    if let Some(cursor) = progress.state.cursor() {
        COLLECTOR_CURSOR_HEIGHT.set(cursor);
    }
    if let Some(latest) = progress.latest {
        CHAIN_LATEST_HEIGHT.set(latest);
    }
    Ok(())
}

pub async fn update_metrics<S>(
    store: Arc<S>,
    book: MonikerBook,
    progress: watch::Receiver<CollectorProgress>,
    every: Duration,
) where
    S: ParticipationStore + 'static,
{
    let mut ticker = ticker(every);
    loop {
        ticker.tick().await;
        let snapshot = *progress.borrow();
        let today = Utc::now().date_naive();
        if let Err(e) = publish_metrics_once(&store, &book, &snapshot, today).await {
            warn!(error = %e, "Metrics update failed");
        }
    }
}

/// Delete rows older than `retention_days` before `today`.
pub async fn prune_once<S>(
    store: &Arc<S>,
    today: NaiveDate,
    retention_days: u32,
) -> StoreResult<usize>
where
    S: ParticipationStore + 'static,
{
    let cutoff = today - ChronoDuration::days(i64::from(retention_days));
    on_blocking_pool(store, move |s| s.prune_before(cutoff)).await
}

/// Prune once a day, starting one day after launch.
pub async fn prune_daily<S>(store: Arc<S>, retention_days: u32)
where
    S: ParticipationStore + 'static,
{
    let mut ticker = ticker(DAY);
    loop {
        ticker.tick().await;
        if let Err(e) = prune_once(&store, Utc::now().date_naive(), retention_days).await {
            warn!(error = %e, "Prune failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{AlertKind, MonikerMap, ParticipationRecord};
    use vw_02_moniker_resolver::{
        MonikerResolver, StaticDirectory, StaticGenesis, StaticValidatorSet,
    };
    use vw_03_participation_store::SqliteStore;
    use vw_04_alerting::RecordingSink;
    use vw_05_realtime_collector::CollectorState;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn rows(
        date: NaiveDate,
        heights: std::ops::RangeInclusive<i64>,
        address: &str,
        missed: i64,
    ) -> Vec<ParticipationRecord> {
        heights
            .map(|h| ParticipationRecord {
                date,
                block_height: h,
                address: address.to_string(),
                moniker: "stored".to_string(),
                participated: h % 10 >= missed,
                tx_contribution: false,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_announces_only_new_validators() {
        let validators = Arc::new(StaticValidatorSet::new(&["g1a"]));
        let resolver = MonikerResolver::new(
            Arc::clone(&validators),
            Arc::new(StaticDirectory::new(&[("g1b", "Bravo")])),
            Arc::new(StaticGenesis::new(&[])),
        );
        let sink = RecordingSink::new();
        let (tx, rx) = watch::channel(CollectorProgress::default());

        assert_eq!(refresh_monikers_once(&resolver, &sink, &rx).await, 0);

        tx.send_replace(CollectorProgress {
            state: CollectorState::Idle { cursor: 42 },
            latest: Some(42),
        });
        validators.set(&["g1a", "g1b"]);
        assert_eq!(refresh_monikers_once(&resolver, &sink, &rx).await, 1);

        let added = sink.of_kind(AlertKind::NewValidator);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].address(), "g1b");
        assert_eq!(added[0].moniker(), "Bravo");
        assert_eq!(added[0].start_height, 42);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_map() {
        let validators = Arc::new(StaticValidatorSet::new(&["g1a"]));
        let resolver = MonikerResolver::new(
            Arc::clone(&validators),
            Arc::new(StaticDirectory::new(&[])),
            Arc::new(StaticGenesis::new(&[])),
        );
        let sink = RecordingSink::new();
        let (_tx, rx) = watch::channel(CollectorProgress::default());
        refresh_monikers_once(&resolver, &sink, &rx).await;

        validators.set_unavailable();
        assert_eq!(refresh_monikers_once(&resolver, &sink, &rx).await, 0);
        assert!(resolver.snapshot().contains_key("g1a"));
    }

    #[tokio::test]
    async fn test_prune_keeps_retention_window() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.upsert_records(&rows(day(1), 1..=10, "g1a", 0)).unwrap();
        store.upsert_records(&rows(day(10), 11..=20, "g1a", 0)).unwrap();

        assert_eq!(prune_once(&store, day(15), 7).await.unwrap(), 10);
        assert_eq!(store.count_rows().unwrap(), 10);
        assert_eq!(prune_once(&store, day(15), 7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_metrics_use_current_monikers() {
        vw_telemetry::register_metrics().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.upsert_records(&rows(day(14), 1..=10, "g1metrics", 2)).unwrap();

        let mut map = MonikerMap::new();
        map.insert("g1metrics".into(), "Current".into());
        let book = MonikerBook::from_map(map);
        let progress = CollectorProgress {
            state: CollectorState::Idle { cursor: 10 },
            latest: Some(12),
        };

        publish_metrics_once(&store, &book, &progress, day(14))
            .await
            .unwrap();

        let text = vw_telemetry::encode_metrics().unwrap();
        assert!(text.contains(r#"validator_address="g1metrics""#));
        assert!(text.contains(r#"moniker="Current""#));
        assert!(!text.contains(r#"moniker="stored""#));
        assert_eq!(COLLECTOR_CURSOR_HEIGHT.get(), 10);
        assert_eq!(CHAIN_LATEST_HEIGHT.get(), 12);
    }
}
