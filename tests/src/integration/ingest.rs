//! # Ingestion Flows
//!
//! Backfill, real-time collection and restarts writing to one database.
//!
//! ```text
//! MemoryBlockSource ──→ BackfillEngine ──┐
//!                  └──→ RealtimeCollector ┴──→ SqliteStore (file)
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{chain, chain_day, resolver, VALIDATORS};
    use std::sync::Arc;
    use vw_02_moniker_resolver::MonikerResolverApi;
    use vw_03_participation_store::{DateRange, HeightRange, ParticipationStore, SqliteStore};
    use vw_04_alerting::RecordingSink;
    use vw_05_realtime_collector::{CollectorConfig, RealtimeCollector, StepOutcome};
    use vw_06_backfill::{BackfillConfig, BackfillEngine};

    #[tokio::test]
    async fn test_collector_resumes_where_backfill_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("participation.db")).unwrap());
        let source = Arc::new(chain(40, 20, &[]));
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();
        let resolver = Arc::new(resolver);

        let engine = BackfillEngine::new(
            Arc::clone(&source),
            Arc::clone(&store),
            BackfillConfig::default(),
        );
        let report = engine.run(0, 20, resolver.snapshot()).await.unwrap();
        assert_eq!(report.written.rows, 60);

        let mut collector = RealtimeCollector::new(
            Arc::clone(&source),
            Arc::clone(&store),
            Arc::clone(&resolver),
            Arc::new(RecordingSink::new()),
            CollectorConfig::for_testing(),
        );
        assert_eq!(collector.initialize().await.unwrap(), 20);

        source.set_tip(40);
        assert_eq!(
            collector.step().await.unwrap(),
            StepOutcome::Advanced {
                cursor: 40,
                processed: 20,
                skipped: 0
            }
        );

        assert_eq!(store.count_rows().unwrap(), 40 * VALIDATORS.len() as u64);
        assert_eq!(
            store.height_range(chain_day()).unwrap(),
            Some(HeightRange { min: 1, max: 40 })
        );

        // Alpha signs every block, so it proposes every block with txs.
        let shares = store.tx_contribution(DateRange::day(chain_day())).unwrap();
        let alpha = shares.iter().find(|s| s.address == "g1alpha").unwrap();
        assert_eq!(alpha.percent, 100.0);
    }

    #[tokio::test]
    async fn test_restarted_collector_does_not_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participation.db");
        let source = Arc::new(chain(35, 10, &[]));
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();
        let resolver = Arc::new(resolver);

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            let mut first = RealtimeCollector::new(
                Arc::clone(&source),
                store,
                Arc::clone(&resolver),
                Arc::new(RecordingSink::new()),
                CollectorConfig::for_testing(),
            );
            // Empty store: starts at the tip and records nothing below it.
            assert_eq!(first.initialize().await.unwrap(), 10);
            source.set_tip(30);
            first.step().await.unwrap();
        }

        let fetched_before = source.fetched().len();
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let mut second = RealtimeCollector::new(
            Arc::clone(&source),
            Arc::clone(&store),
            Arc::clone(&resolver),
            Arc::new(RecordingSink::new()),
            CollectorConfig::for_testing(),
        );
        assert_eq!(second.initialize().await.unwrap(), 30);

        source.set_tip(35);
        second.step().await.unwrap();

        assert_eq!(source.fetched()[fetched_before..], [31, 32, 33, 34, 35]);
        assert_eq!(
            store.height_range(chain_day()).unwrap(),
            Some(HeightRange { min: 11, max: 35 })
        );
    }

    #[tokio::test]
    async fn test_parallel_backfill_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participation.db");
        let source = Arc::new(chain(500, 500, &[(250, "g1bravo")]));
        source.fail_height(100);
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            let engine = BackfillEngine::new(
                Arc::clone(&source),
                store,
                BackfillConfig {
                    parallel_flush: 64,
                    ..BackfillConfig::parallel(8)
                },
            );
            let report = engine.run(0, 500, resolver.snapshot()).await.unwrap();
            assert_eq!(report.skipped, 1);
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count_rows().unwrap(), 499 * 3);
        assert!(store.records_at(100).unwrap().is_empty());

        let at_250 = store.records_at(250).unwrap();
        let bravo = at_250.iter().find(|r| r.address == "g1bravo").unwrap();
        assert!(!bravo.participated);
        assert_eq!(bravo.moniker, "Bravo");

        let missed = store.missed_counts(chain_day()).unwrap();
        assert_eq!(missed.iter().map(|c| c.count).sum::<u64>(), 1);
    }
}
