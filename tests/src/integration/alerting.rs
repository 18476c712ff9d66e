//! # Alerting Flows
//!
//! Stored participation and collector observations turned into alerts, each
//! alert recorded once in the alert log.

#[cfg(test)]
mod tests {
    use crate::fixtures::{chain, chain_day, resolver};
    use shared_types::{AlertKind, Severity};
    use std::sync::Arc;
    use std::time::Duration;
    use vw_02_moniker_resolver::MonikerResolverApi;
    use vw_03_participation_store::{AlertLogStore, SqliteStore};
    use vw_04_alerting::{MissedBlockWatcher, PersistingSink, RecordingSink};
    use vw_05_realtime_collector::{CollectorConfig, RealtimeCollector};
    use vw_06_backfill::{BackfillConfig, BackfillEngine};

    type LoggedSink = PersistingSink<Arc<RecordingSink>, SqliteStore>;

    fn logged_sink(store: &Arc<SqliteStore>) -> (Arc<RecordingSink>, Arc<LoggedSink>) {
        let recording = Arc::new(RecordingSink::new());
        let sink = Arc::new(PersistingSink::new(
            Arc::clone(&recording),
            Arc::clone(store),
        ));
        (recording, sink)
    }

    #[tokio::test]
    async fn test_missed_blocks_alert_once_and_log_once() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let source = Arc::new(chain(
            30,
            30,
            &[
                (11, "g1charlie"),
                (12, "g1charlie"),
                (13, "g1charlie"),
                (20, "g1bravo"),
            ],
        ));
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();
        BackfillEngine::new(
            Arc::clone(&source),
            Arc::clone(&store),
            BackfillConfig::default(),
        )
        .run(0, 30, resolver.snapshot())
        .await
        .unwrap();

        let (recording, sink) = logged_sink(&store);
        let mut watcher = MissedBlockWatcher::new(Arc::clone(&store), Arc::clone(&sink));
        let mut alerts = watcher.check(chain_day()).await.unwrap();
        alerts.sort_by(|a, b| a.address().cmp(b.address()));

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].address(), "g1bravo");
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[1].address(), "g1charlie");
        assert_eq!(alerts[1].severity, Severity::Critical);
        assert_eq!(alerts[1].moniker(), "Charlie");

        assert!(watcher.check(chain_day()).await.unwrap().is_empty());
        assert_eq!(recording.of_kind(AlertKind::MissedBlocks).len(), 2);

        // A restarted watcher re-fires, the log keeps one row per alert.
        let mut restarted = MissedBlockWatcher::new(Arc::clone(&store), Arc::clone(&sink));
        assert_eq!(restarted.check(chain_day()).await.unwrap().len(), 2);
        assert_eq!(recording.of_kind(AlertKind::MissedBlocks).len(), 4);

        let logged = store.recent_alerts(10).unwrap();
        assert_eq!(logged.len(), 2);
        assert!(logged
            .iter()
            .any(|e| e.address == "g1charlie" && e.level == "CRITICAL"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_and_restore_reach_the_alert_log() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let source = Arc::new(chain(20, 10, &[]));
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();
        let (recording, sink) = logged_sink(&store);

        let mut collector = RealtimeCollector::new(
            Arc::clone(&source),
            Arc::clone(&store),
            Arc::new(resolver),
            sink,
            CollectorConfig::for_testing(),
        );
        let task = tokio::spawn(async move { collector.run().await });

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(recording.of_kind(AlertKind::ChainStalled).len(), 1);
        assert!(recording.of_kind(AlertKind::ChainRestored).is_empty());

        source.set_tip(20);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(recording.of_kind(AlertKind::ChainStalled).len(), 1);
        assert_eq!(recording.of_kind(AlertKind::ChainRestored).len(), 1);
        assert_eq!(store.count_rows().unwrap(), 10 * 3);

        task.abort();

        let levels: Vec<String> = store
            .recent_alerts(10)
            .unwrap()
            .into_iter()
            .map(|e| e.level)
            .collect();
        assert!(levels.contains(&"CRITICAL".to_string()));
        assert!(levels.contains(&"RESOLVED".to_string()));
    }
}
