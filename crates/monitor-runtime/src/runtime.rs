//! Wiring of the subsystem crates into one running monitor.
//!
//! ## Startup Sequence
//!
//! 1. Open the participation database
//! 2. Build the RPC client and the moniker resolver
//! 3. Load the moniker map once (blocking, so the collector never starts blind)
//! 4. Start the supervised tasks: collector, moniker refresher, missed-block
//!    poller, metrics updater and, when retention is set, the pruner
//! 5. Start one report loop per stored schedule
//! 6. Wait for Ctrl+C, then signal shutdown and join every task

use crate::adapters::{GenesisAdapter, Resolver, Sink};
use crate::config::MonitorConfig;
use crate::supervisor::{supervise, SupervisorExit, DEFAULT_RESTART_DELAY};
use crate::tasks;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared_types::{Height, ScheduleEntry};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vw_01_block_source::RpcClient;
use vw_02_moniker_resolver::{MonikerResolverApi, RpcValidatorSet, ValopersDirectory};
use vw_03_participation_store::{ScheduleStore, SqliteStore};
use vw_04_alerting::{LogSink, MissedBlockWatcher, PersistingSink};
use vw_05_realtime_collector::{CollectorProgress, RealtimeCollector};
use vw_06_backfill::{BackfillEngine, BackfillReport, Strategy};
use vw_07_report_scheduler::{validate_time, ReportScheduler};
use vw_telemetry::BACKFILL_ROWS_WRITTEN;

/// Per-validator gauges are recomputed this often.
pub const METRICS_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// All long-lived components of a monitor process.
pub struct MonitorRuntime {
    config: MonitorConfig,
    store: Arc<SqliteStore>,
    client: Arc<RpcClient>,
    resolver: Arc<Resolver>,
    sink: Arc<Sink>,
    progress: Arc<watch::Sender<CollectorProgress>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Open the store named by the configuration.
pub fn open_store(config: &MonitorConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.store.path)
        .and_then(|store| store.with_max_bind_params(config.store.max_bind_params))
        .with_context(|| format!("opening database {}", config.store.path.display()))
}

fn build_resolver(config: &MonitorConfig, client: &Arc<RpcClient>) -> Resolver {
    let validators = RpcValidatorSet::new(Arc::clone(client), config.retry_policy());
    let directory = match &config.resolver.valopers_realm {
        Some(realm) => ValopersDirectory::with_realm(Arc::clone(client), realm.clone()),
        None => ValopersDirectory::new(Arc::clone(client)),
    };
    let genesis = GenesisAdapter::new(Arc::clone(client), config.resolver.genesis_file.clone());
    Resolver::new(Arc::new(validators), Arc::new(directory), Arc::new(genesis))
}

impl MonitorRuntime {
    /// Build every component. Nothing is started and no request is sent.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let store = Arc::new(open_store(&config)?);
        let client = Arc::new(
            RpcClient::new(config.rpc_config()).context("building the RPC client")?,
        );
        let resolver = Arc::new(build_resolver(&config, &client));
        let sink = Arc::new(PersistingSink::new(LogSink, Arc::clone(&store)));
        let (progress, _) = watch::channel(CollectorProgress::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            store,
            client,
            resolver,
            sink,
            progress: Arc::new(progress),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::clone(&self.store)
    }

    /// Collector progress as last published.
    pub fn progress(&self) -> watch::Receiver<CollectorProgress> {
        self.progress.subscribe()
    }

    /// Ask every supervised task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run until Ctrl+C.
    pub async fn run(&self, reports: bool) -> Result<()> {
        self.run_until(reports, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `stop` completes, then shut everything down.
    pub async fn run_until(&self, reports: bool, stop: impl Future<Output = ()>) -> Result<()> {
        info!("===========================================");
        info!("  Validator-Watch Monitor v{}", env!("CARGO_PKG_VERSION"));
        info!("  RPC: {}", self.config.rpc.endpoint);
        info!("===========================================");

        match self.resolver.refresh().await {
            Ok(outcome) => info!(validators = outcome.total, "Moniker map loaded"),
            Err(e) => warn!(error = %e, "Initial moniker load failed, names will be unknown"),
        }

        let tasks = self.start_tasks();

        let scheduler = ReportScheduler::new(
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            self.resolver.book(),
        )
        .with_threshold(self.config.reports.low_rate_threshold);
        if reports {
            let started = scheduler.start_all().context("loading report schedules")?;
            info!(users = started, "Report loops started");
        } else {
            info!("Daily reports disabled");
        }

        info!("Monitor is running. Press Ctrl+C to stop.");
        stop.await;

        info!("Shutting down");
        self.shutdown();
        scheduler.shutdown();
        for (name, task) in tasks {
            match task.await {
                Ok(exit) => info!(task = name, ?exit, "Task stopped"),
                Err(e) => warn!(task = name, error = %e, "Task ended abnormally"),
            }
        }
        Ok(())
    }

    fn start_tasks(&self) -> Vec<(&'static str, JoinHandle<SupervisorExit>)> {
        let mut tasks = Vec::new();

        let (source, store, resolver, sink) = (
            Arc::clone(&self.client),
            Arc::clone(&self.store),
            Arc::clone(&self.resolver),
            Arc::clone(&self.sink),
        );
        let progress = Arc::clone(&self.progress);
        let collector_config = self.config.collector_config();
        tasks.push(self.spawn_supervised("collector", move || {
            let mut collector = RealtimeCollector::new(
                Arc::clone(&source),
                Arc::clone(&store),
                Arc::clone(&resolver),
                Arc::clone(&sink),
                collector_config.clone(),
            )
            .with_progress(Arc::clone(&progress));
            async move { collector.run().await }
        }));

        let (resolver, sink) = (Arc::clone(&self.resolver), Arc::clone(&self.sink));
        let progress = self.progress.subscribe();
        let every = Duration::from_secs(self.config.resolver.refresh_interval_secs.max(1));
        tasks.push(self.spawn_supervised("moniker-refresher", move || {
            tasks::refresh_monikers(
                Arc::clone(&resolver),
                Arc::clone(&sink),
                progress.clone(),
                every,
            )
        }));

        let (store, sink) = (Arc::clone(&self.store), Arc::clone(&self.sink));
        let poll = Duration::from_secs(self.config.alerts.missed_poll_secs.max(1));
        tasks.push(self.spawn_supervised("missed-blocks", move || {
            let mut watcher = MissedBlockWatcher::new(Arc::clone(&store), Arc::clone(&sink));
            async move { watcher.run(poll).await }
        }));

        let store = Arc::clone(&self.store);
        let book = self.resolver.book();
        let progress = self.progress.subscribe();
        tasks.push(self.spawn_supervised("metrics", move || {
            tasks::update_metrics(
                Arc::clone(&store),
                book.clone(),
                progress.clone(),
                METRICS_INTERVAL,
            )
        }));

        let retention_days = self.config.store.retention_days;
        if retention_days > 0 {
            let store = Arc::clone(&self.store);
            tasks.push(self.spawn_supervised("pruner", move || {
                tasks::prune_daily(Arc::clone(&store), retention_days)
            }));
        }

        tasks
    }

    fn spawn_supervised<F, Fut>(
        &self,
        name: &'static str,
        factory: F,
    ) -> (&'static str, JoinHandle<SupervisorExit>)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown_rx.clone();
        (
            name,
            tokio::spawn(supervise(name, DEFAULT_RESTART_DELAY, shutdown, factory)),
        )
    }
}

/// Backfill `from + 1 ..= to` with the live moniker map.
pub async fn run_backfill(
    config: &MonitorConfig,
    from: Height,
    to: Height,
    parallel: bool,
    workers: Option<usize>,
) -> Result<BackfillReport> {
    let store = Arc::new(open_store(config)?);
    let client =
        Arc::new(RpcClient::new(config.rpc_config()).context("building the RPC client")?);

    let resolver = build_resolver(config, &client);
    resolver
        .refresh()
        .await
        .context("loading validator monikers")?;
    let monikers = resolver.snapshot();

    let mut backfill = config.backfill_config();
    if parallel {
        backfill.strategy = Strategy::Parallel;
    }
    if let Some(workers) = workers {
        backfill.workers = workers.max(1);
    }

    let engine = BackfillEngine::new(client, store, backfill);
    let report = engine.run(from, to, monikers).await?;
    BACKFILL_ROWS_WRITTEN.inc_by(report.written.rows as u64);
    Ok(report)
}

/// Persist a report time for `user`, filling unset fields from the
/// configured defaults.
pub fn save_schedule<S>(
    store: &S,
    config: &MonitorConfig,
    user: &str,
    hour: Option<u32>,
    minute: Option<u32>,
    timezone: Option<String>,
) -> Result<ScheduleEntry>
where
    S: ScheduleStore,
{
    let hour = hour.unwrap_or(config.reports.default_hour);
    let minute = minute.unwrap_or(config.reports.default_minute);
    validate_time(hour, minute)?;

    let timezone = timezone.unwrap_or_else(|| config.reports.default_timezone.clone());
    let entry = ScheduleEntry::new(user, hour, minute, timezone);
    store
        .save_schedule(&entry)
        .with_context(|| format!("saving schedule for {user}"))?;
    info!(
        user_id = %entry.user_id,
        hour,
        minute,
        timezone = %entry.timezone,
        "Schedule saved"
    );
    Ok(entry)
}

/// Render the summary for `date` using the current moniker map.
pub async fn render_report(config: &MonitorConfig, date: NaiveDate) -> Result<String> {
    let store = Arc::new(open_store(config)?);
    let client =
        Arc::new(RpcClient::new(config.rpc_config()).context("building the RPC client")?);
    let resolver = build_resolver(config, &client);
    if let Err(e) = resolver.refresh().await {
        warn!(error = %e, "Moniker refresh failed, falling back to unknown names");
    }

    let scheduler = ReportScheduler::new(store, Arc::new(LogSink), resolver.book())
        .with_threshold(config.reports.low_rate_threshold);
    Ok(scheduler.render(date)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ParticipationRecord;
    use vw_03_participation_store::ParticipationStore;

    fn config_in(dir: &tempfile::TempDir) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.store.path = dir.path().join("db").join("participation.db");
        // Nothing listens here; every request fails fast.
        config.rpc.endpoint = "http://127.0.0.1:9".to_string();
        config.rpc.request_timeout_secs = 1;
        config.rpc.connect_timeout_secs = 1;
        config.rpc.retry_attempts = 1;
        config
    }

    #[test]
    fn test_save_schedule_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let store = open_store(&config).unwrap();

        let entry = save_schedule(&store, &config, "u1", None, Some(45), None).unwrap();
        assert_eq!(entry, ScheduleEntry::new("u1", 9, 45, "Europe/Paris"));
        assert_eq!(store.schedule_for("u1").unwrap(), Some(entry));
    }

    #[test]
    fn test_save_schedule_rejects_bad_time() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let store = open_store(&config).unwrap();

        assert!(save_schedule(&store, &config, "u1", Some(24), Some(0), None).is_err());
        assert!(store.schedule_for("u1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_report_without_rpc() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        {
            let store = open_store(&config).unwrap();
            store
                .upsert_records(&[ParticipationRecord {
                    date,
                    block_height: 7,
                    address: "g1a".into(),
                    moniker: "Alpha".into(),
                    participated: true,
                    tx_contribution: false,
                }])
                .unwrap();
        }

        let report = render_report(&config, date).await.unwrap();
        assert!(report.starts_with("📊 Daily Summary for 2025-07-14 (Blocks 7 → 7):"));
        assert!(report.contains("addr: (g1a) rate: 100.00%"));
    }

    #[tokio::test]
    async fn test_runtime_starts_and_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.store.retention_days = 30;
        let runtime = MonitorRuntime::new(config).unwrap();

        runtime
            .run_until(true, tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert!(*runtime.shutdown_rx.borrow());
        assert!(dir.path().join("db").join("participation.db").exists());
    }
}
