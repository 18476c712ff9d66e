//! Real-time collection loop.

use crate::config::CollectorConfig;
use crate::domain::{CollectorProgress, CollectorState, StepOutcome};
use crate::error::CollectorResult;
use shared_types::{records_for_block, Height};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vw_01_block_source::BlockSource;
use vw_02_moniker_resolver::MonikerResolverApi;
use vw_03_participation_store::{on_blocking_pool, ParticipationStore};
use vw_04_alerting::{
    dispatch, messages, NotificationSink, ParticipationWindow, RpcErrorDebouncer,
    StagnationMonitor, StallTransition,
};

/// Follows the chain tip and records participation.
///
/// All alert state lives here and is touched only by the task driving the
/// loop.
pub struct RealtimeCollector<B, S, R, N>
where
    B: BlockSource,
    S: ParticipationStore,
    R: MonikerResolverApi,
    N: NotificationSink,
{
    source: Arc<B>,
    store: Arc<S>,
    resolver: Arc<R>,
    sink: Arc<N>,
    config: CollectorConfig,
    cursor: Option<Height>,
    stagnation: StagnationMonitor,
    rpc_errors: RpcErrorDebouncer,
    window: ParticipationWindow,
    since_refresh: u64,
    progress: Arc<watch::Sender<CollectorProgress>>,
}

impl<B, S, R, N> RealtimeCollector<B, S, R, N>
where
    B: BlockSource,
    S: ParticipationStore + 'static,
    R: MonikerResolverApi,
    N: NotificationSink,
{
    pub fn new(
        source: Arc<B>,
        store: Arc<S>,
        resolver: Arc<R>,
        sink: Arc<N>,
        config: CollectorConfig,
    ) -> Self {
        let (progress, _) = watch::channel(CollectorProgress::default());
        Self {
            stagnation: StagnationMonitor::new(config.stall_threshold),
            rpc_errors: RpcErrorDebouncer::new(config.rpc_alert_debounce),
            window: ParticipationWindow::new(config.window_size),
            source,
            store,
            resolver,
            sink,
            config,
            cursor: None,
            since_refresh: 0,
            progress: Arc::new(progress),
        }
    }

    /// Publish progress on a caller-owned channel.
    pub fn with_progress(mut self, progress: Arc<watch::Sender<CollectorProgress>>) -> Self {
        self.progress = progress;
        self
    }

    /// Subscribe to per-iteration progress.
    pub fn progress(&self) -> watch::Receiver<CollectorProgress> {
        self.progress.subscribe()
    }

    pub fn cursor(&self) -> Option<Height> {
        self.cursor
    }

    fn publish(&self, state: CollectorState, latest: Option<Height>) {
        self.progress.send_replace(CollectorProgress { state, latest });
    }

    /// Compute the starting cursor: the highest stored height, or the live
    /// tip when the store is empty.
    pub async fn initialize(&mut self) -> CollectorResult<Height> {
        let cursor = match on_blocking_pool(&self.store, |s| s.last_stored_height()).await? {
            Some(stored) => {
                info!(cursor = stored, "Resuming from last stored height");
                stored
            }
            None => {
                let tip = self.source.latest_height().await?;
                info!(cursor = tip, "Store empty, starting at chain tip");
                tip
            }
        };
        self.cursor = Some(cursor);
        self.publish(CollectorState::Idle { cursor }, None);
        Ok(cursor)
    }

    /// One loop iteration. Initializes on first use.
    pub async fn step(&mut self) -> CollectorResult<StepOutcome> {
        let cursor = match self.cursor {
            Some(c) => c,
            None => self.initialize().await?,
        };

        let latest = match self.source.latest_height().await {
            Ok(h) => {
                self.rpc_errors.on_success();
                h
            }
            Err(e) => {
                warn!(error = %e, cursor, "Failed to query latest block height");
                if self.rpc_errors.on_error(Instant::now()) {
                    let alert = messages::rpc_unreachable(&e.to_string(), cursor);
                    dispatch(self.sink.as_ref(), &[alert]).await;
                }
                return Ok(StepOutcome::RpcError);
            }
        };

        if let Some(transition) = self.stagnation.observe(latest, Instant::now()) {
            let alert = match transition {
                StallTransition::Stalled {
                    height,
                    stalled_for,
                } => {
                    warn!(height, "Chain stalled");
                    messages::chain_stalled(height, stalled_for)
                }
                StallTransition::Restored {
                    stalled_at,
                    height,
                    stalled_for,
                } => {
                    info!(height, stalled_at, "Chain activity restored");
                    messages::chain_restored(stalled_at, height, stalled_for)
                }
            };
            dispatch(self.sink.as_ref(), &[alert]).await;
        }

        if latest <= cursor {
            self.publish(CollectorState::Idle { cursor }, Some(latest));
            return Ok(StepOutcome::Idle);
        }

        self.publish(CollectorState::from_heights(cursor, latest), Some(latest));
        debug!(from = cursor + 1, to = latest, "Catching up");

        let mut processed = 0;
        let mut skipped = 0;
        for height in (cursor + 1)..=latest {
            if self.process_height(height).await {
                processed += 1;
            } else {
                skipped += 1;
            }
            self.cursor = Some(height);
        }

        self.publish(CollectorState::Idle { cursor: latest }, Some(latest));
        Ok(StepOutcome::Advanced {
            cursor: latest,
            processed,
            skipped,
        })
    }

    /// Fetch, persist and evaluate one height. Returns whether rows were
    /// written.
    async fn process_height(&mut self, height: Height) -> bool {
        let block = match self.source.block(height).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                debug!(height, "Block has no last-commit, skipping");
                return false;
            }
            Err(e) => {
                warn!(height, error = %e, "Failed to fetch block, skipping");
                return false;
            }
        };

        let monikers = self.resolver.snapshot();
        let records = records_for_block(&block, &monikers);
        let alerts = self.window.observe(&records);
        if records.is_empty() {
            debug!(height, "No known validators yet, nothing to record");
        } else if let Err(e) =
            on_blocking_pool(&self.store, move |s| s.upsert_records(&records)).await
        {
            error!(height, error = %e, "Failed to save participation");
        }

        if !alerts.is_empty() {
            dispatch(self.sink.as_ref(), &alerts).await;
        }

        self.since_refresh += 1;
        if self.since_refresh >= self.config.refresh_every {
            self.since_refresh = 0;
            self.refresh_monikers(height).await;
        }
        true
    }

    async fn refresh_monikers(&self, height: Height) {
        match self.resolver.refresh().await {
            Ok(outcome) => {
                let alerts: Vec<_> = outcome
                    .added
                    .iter()
                    .map(|(address, moniker)| messages::new_validator(address, moniker, height))
                    .collect();
                dispatch(self.sink.as_ref(), &alerts).await;
            }
            Err(e) => warn!(height, error = %e, "Moniker refresh failed"),
        }
    }

    /// Run forever. Errors are logged and retried after the configured
    /// backoff; only a panic leaves this function.
    pub async fn run(&mut self) {
        info!(
            idle_poll_ms = self.config.idle_poll.as_millis() as u64,
            refresh_every = self.config.refresh_every,
            "Real-time collector started"
        );
        loop {
            let pause = match self.step().await {
                Ok(StepOutcome::Advanced { .. }) => continue,
                Ok(StepOutcome::Idle) => self.config.idle_poll,
                Ok(StepOutcome::RpcError) => self.config.error_backoff,
                Err(e) => {
                    warn!(error = %e, "Collector iteration failed");
                    self.config.error_backoff
                }
            };
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::AlertKind;
    use std::time::Duration;
    use vw_01_block_source::MemoryBlockSource;
    use vw_02_moniker_resolver::{
        MonikerResolver, StaticDirectory, StaticGenesis, StaticValidatorSet,
    };
    use vw_03_participation_store::SqliteStore;
    use vw_04_alerting::RecordingSink;

    type Resolver = MonikerResolver<StaticValidatorSet, StaticDirectory, StaticGenesis>;
    type Collector = RealtimeCollector<MemoryBlockSource, SqliteStore, Resolver, RecordingSink>;

    struct Harness {
        source: Arc<MemoryBlockSource>,
        store: Arc<SqliteStore>,
        set: Arc<StaticValidatorSet>,
        sink: Arc<RecordingSink>,
        collector: Collector,
    }

    async fn harness(source: MemoryBlockSource, config: CollectorConfig) -> Harness {
        let source = Arc::new(source);
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let set = Arc::new(StaticValidatorSet::new(&["g1a", "g1b", "g1c"]));
        let resolver = Arc::new(MonikerResolver::new(
            Arc::clone(&set),
            Arc::new(StaticDirectory::new(&[("g1a", "Alpha")])),
            Arc::new(StaticGenesis::empty()),
        ));
        resolver.refresh().await.unwrap();
        let sink = Arc::new(RecordingSink::new());
        let collector = RealtimeCollector::new(
            Arc::clone(&source),
            Arc::clone(&store),
            resolver,
            Arc::clone(&sink),
            config,
        );
        Harness {
            source,
            store,
            set,
            sink,
            collector,
        }
    }

    #[tokio::test]
    async fn test_empty_store_starts_at_tip() {
        let mut h = harness(
            MemoryBlockSource::with_chain(60, &["g1a", "g1b", "g1c"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.source.set_tip(50);

        assert_eq!(h.collector.initialize().await.unwrap(), 50);
        assert!(h.source.fetched().is_empty());

        h.source.set_tip(53);
        let outcome = h.collector.step().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                cursor: 53,
                processed: 3,
                skipped: 0
            }
        );
        assert_eq!(h.source.fetched(), vec![51, 52, 53]);
        assert_eq!(h.store.count_rows().unwrap(), 9);
    }

    #[tokio::test]
    async fn test_resumes_from_stored_height() {
        let mut h = harness(
            MemoryBlockSource::with_chain(25, &["g1a", "g1b"]),
            CollectorConfig::for_testing(),
        )
        .await;
        let seeded = MemoryBlockSource::make_block(20, &["g1a"], false);
        h.store
            .upsert_records(&records_for_block(&seeded, &h.collector.resolver.snapshot()))
            .unwrap();

        assert_eq!(h.collector.initialize().await.unwrap(), 20);
        h.collector.step().await.unwrap();

        assert_eq!(h.source.fetched(), vec![21, 22, 23, 24, 25]);
        assert_eq!(h.collector.cursor(), Some(25));

        // Stored row for 20 is untouched.
        let at_20 = h.store.records_at(20).unwrap();
        assert!(at_20.iter().any(|r| r.address == "g1b" && !r.participated));
    }

    #[tokio::test]
    async fn test_failed_height_is_skipped() {
        let mut h = harness(
            MemoryBlockSource::with_chain(15, &["g1a", "g1b", "g1c"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.source.set_tip(10);
        h.collector.initialize().await.unwrap();
        h.source.set_tip(15);
        h.source.fail_height(12);

        let outcome = h.collector.step().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                cursor: 15,
                processed: 4,
                skipped: 1
            }
        );
        assert!(h.store.records_at(12).unwrap().is_empty());
        assert_eq!(h.store.records_at(13).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_idle_when_tip_not_past_cursor() {
        let mut h = harness(
            MemoryBlockSource::with_chain(5, &["g1a"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.collector.initialize().await.unwrap();
        assert_eq!(h.collector.step().await.unwrap(), StepOutcome::Idle);
        assert_eq!(
            h.collector.progress().borrow().state,
            CollectorState::Idle { cursor: 5 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_and_restore_alert_once_each() {
        let mut h = harness(
            MemoryBlockSource::with_chain(101, &["g1a", "g1b", "g1c"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.source.set_tip(100);
        h.collector.initialize().await.unwrap();
        h.source.script_latest([Some(100), Some(100), Some(100), Some(101)]);

        h.collector.step().await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        h.collector.step().await.unwrap();
        tokio::time::advance(Duration::from_secs(121)).await;
        h.collector.step().await.unwrap();

        assert_eq!(h.sink.of_kind(AlertKind::ChainStalled).len(), 1);
        assert!(h.sink.of_kind(AlertKind::ChainRestored).is_empty());

        h.collector.step().await.unwrap();
        assert_eq!(h.sink.of_kind(AlertKind::ChainStalled).len(), 1);
        assert_eq!(h.sink.of_kind(AlertKind::ChainRestored).len(), 1);
        assert_eq!(h.collector.cursor(), Some(101));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rpc_error_alert_is_debounced() {
        let mut h = harness(
            MemoryBlockSource::with_chain(5, &["g1a"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.collector.initialize().await.unwrap();
        h.source.script_latest(std::iter::repeat(None).take(70));

        for _ in 0..70 {
            assert_eq!(h.collector.step().await.unwrap(), StepOutcome::RpcError);
            tokio::time::advance(Duration::from_secs(10)).await;
        }

        // 700 s of outage: alerts at t=0 and after the 10-minute gap.
        assert_eq!(h.sink.of_kind(AlertKind::RpcUnreachable).len(), 2);
    }

    #[tokio::test]
    async fn test_periodic_refresh_announces_new_validator() {
        let config = CollectorConfig {
            refresh_every: 5,
            ..CollectorConfig::for_testing()
        };
        let mut h = harness(MemoryBlockSource::with_chain(20, &["g1a", "g1b"]), config).await;
        h.source.set_tip(10);
        h.collector.initialize().await.unwrap();

        h.set.set(&["g1a", "g1b", "g1c", "g1d"]);
        h.source.set_tip(15);
        h.collector.step().await.unwrap();

        let added: Vec<_> = h
            .sink
            .of_kind(AlertKind::NewValidator)
            .iter()
            .map(|n| n.address().to_string())
            .collect();
        assert_eq!(added, vec!["g1d".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_signer_raises_low_participation() {
        let mut h = harness(
            MemoryBlockSource::with_chain(8, &["g1a", "g1b"]),
            CollectorConfig::for_testing(),
        )
        .await;
        h.source.set_tip(3);
        h.collector.initialize().await.unwrap();
        h.source.set_tip(8);
        h.collector.step().await.unwrap();

        let low = h.sink.of_kind(AlertKind::LowParticipation);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].address(), "g1c");
        assert_eq!(low[0].end_height, 4);
    }
}
