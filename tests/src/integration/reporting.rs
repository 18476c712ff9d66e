//! # Reporting Flows
//!
//! Stored schedules and participation rows through the report scheduler.

#[cfg(test)]
mod tests {
    use crate::fixtures::{chain_day, resolver, VALIDATORS};
    use chrono::{TimeZone, Utc};
    use shared_types::{records_for_block, ScheduleEntry};
    use std::sync::Arc;
    use vw_01_block_source::MemoryBlockSource;
    use vw_02_moniker_resolver::MonikerResolverApi;
    use vw_03_participation_store::{ParticipationStore, ScheduleStore, SqliteStore};
    use vw_04_alerting::RecordingSink;
    use vw_07_report_scheduler::{InstantClock, ReportScheduler};

    /// Blocks 1..=20 of the fixture day; Charlie misses 11..=13. Rows carry
    /// a stale moniker for Charlie.
    async fn seeded() -> (Arc<SqliteStore>, vw_02_moniker_resolver::MonikerBook) {
        let (_, resolver) = resolver();
        resolver.refresh().await.unwrap();

        let mut stale = (*resolver.snapshot()).clone();
        stale.insert("g1charlie".into(), "old-name".into());

        let store = SqliteStore::open_in_memory().unwrap();
        for height in 1..=20 {
            let signers: Vec<&str> = VALIDATORS
                .iter()
                .copied()
                .filter(|v| !(*v == "g1charlie" && (11..=13).contains(&height)))
                .collect();
            let block = MemoryBlockSource::make_block(height, &signers, false);
            store.upsert_records(&records_for_block(&block, &stale)).unwrap();
        }
        (Arc::new(store), resolver.book())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_report_uses_live_monikers() {
        let (store, book) = seeded().await;
        let sink = Arc::new(RecordingSink::new());
        let next_morning = Utc.from_utc_datetime(
            &chain_day().succ_opt().unwrap().and_hms_opt(6, 0, 0).unwrap(),
        );
        let scheduler = ReportScheduler::new(Arc::clone(&store), Arc::clone(&sink), book)
            .with_clock(Arc::new(InstantClock::starting_at(next_morning)));

        // 09:00 in Paris is 07:00 UTC in July.
        store
            .save_schedule(&ScheduleEntry::new("ops", 9, 0, "Europe/Paris"))
            .unwrap();
        assert_eq!(scheduler.start_all().unwrap(), 1);

        let t0 = tokio::time::Instant::now();
        sink.changed().await;
        let waited = t0.elapsed().as_secs();
        assert!((3600..3601).contains(&waited), "waited {waited}s");

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "ops");
        let lines: Vec<&str> = reports[0].1.lines().collect();
        assert_eq!(
            lines[0],
            format!("📊 Daily Summary for {} (Blocks 1 → 20):", chain_day())
        );
        assert_eq!(
            lines[2],
            "  🔴 Validator: Charlie addr: (g1charlie) rate: 85.00%"
        );
        assert_eq!(
            lines[3],
            "  🟢 Validator: Alpha addr: (g1alpha) rate: 100.00%"
        );
        assert_eq!(
            lines[4],
            "  🟢 Validator: Bravo addr: (g1bravo) rate: 100.00%"
        );

        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_after_store_update_moves_the_slot() {
        let (store, book) = seeded().await;
        let sink = Arc::new(RecordingSink::new());
        let next_morning = Utc.from_utc_datetime(
            &chain_day().succ_opt().unwrap().and_hms_opt(6, 0, 0).unwrap(),
        );
        let scheduler = ReportScheduler::new(Arc::clone(&store), Arc::clone(&sink), book)
            .with_clock(Arc::new(InstantClock::starting_at(next_morning)));

        store
            .save_schedule(&ScheduleEntry::new("ops", 7, 0, "UTC"))
            .unwrap();
        scheduler.start_all().unwrap();

        store
            .save_schedule(&ScheduleEntry::new("ops", 8, 30, "UTC"))
            .unwrap();
        scheduler.reload("ops").unwrap();
        assert_eq!(scheduler.active_users(), vec!["ops".to_string()]);

        let t0 = tokio::time::Instant::now();
        sink.changed().await;
        let waited = t0.elapsed().as_secs();
        assert!((9000..9001).contains(&waited), "waited {waited}s");
        assert_eq!(sink.reports().len(), 1);

        scheduler.shutdown();
    }
}
