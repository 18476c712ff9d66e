//! Sequential and parallel backfill runs sharing one flush path.

use crate::config::{BackfillConfig, Strategy};
use crate::domain::{BackfillReport, RowBuffer};
use crate::error::{BackfillError, BackfillResult};
use shared_types::{records_for_block, Height, MonikerMap, ParticipationRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use vw_01_block_source::BlockSource;
use vw_03_participation_store::ParticipationStore;

/// What a worker hands the writer for one height.
#[derive(Debug)]
enum BlockOutcome {
    Rows(Vec<ParticipationRecord>),
    Dropped,
}

/// Fetch one block and expand it into rows. Failures are logged here and
/// reported as `None`.
async fn block_rows<B>(
    source: &B,
    height: Height,
    monikers: &MonikerMap,
) -> Option<Vec<ParticipationRecord>>
where
    B: BlockSource + ?Sized,
{
    match source.block(height).await {
        Ok(Some(block)) => Some(records_for_block(&block, monikers)),
        Ok(None) => {
            debug!(height, "Block has no last-commit, dropping");
            None
        }
        Err(e) => {
            warn!(height, error = %e, "Block fetch failed, dropping");
            None
        }
    }
}

pub struct BackfillEngine<B, S>
where
    B: BlockSource + 'static,
    S: ParticipationStore + 'static,
{
    source: Arc<B>,
    store: Arc<S>,
    config: BackfillConfig,
}

impl<B, S> BackfillEngine<B, S>
where
    B: BlockSource + 'static,
    S: ParticipationStore + 'static,
{
    pub fn new(source: Arc<B>, store: Arc<S>, config: BackfillConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Backfill heights `from + 1 ..= to` with the configured strategy.
    pub async fn run(
        &self,
        from: Height,
        to: Height,
        monikers: Arc<MonikerMap>,
    ) -> BackfillResult<BackfillReport> {
        if to < from {
            return Err(BackfillError::InvalidRange { from, to });
        }
        info!(
            from = from + 1,
            to,
            strategy = %self.config.strategy,
            validators = monikers.len(),
            "Backfill started"
        );

        let report = match self.config.strategy {
            Strategy::Sequential => self.run_sequential(from, to, &monikers).await,
            Strategy::Parallel => self.run_parallel(from, to, monikers).await,
        };

        match &report {
            Ok(r) => info!(
                blocks = r.blocks,
                skipped = r.skipped,
                rows = r.written.rows,
                statements = r.written.statements,
                "Backfill finished"
            ),
            Err(e) => error!(error = %e, "Backfill aborted"),
        }
        report
    }

    /// Write one batch on the blocking pool.
    async fn flush(
        &self,
        batch: Vec<ParticipationRecord>,
        report: &mut BackfillReport,
    ) -> BackfillResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let rows = batch.len();
        let store = Arc::clone(&self.store);
        let written = tokio::task::spawn_blocking(move || store.upsert_records(&batch))
            .await
            .map_err(|e| BackfillError::Writer(e.to_string()))??;
        debug!(rows, statements = written.statements, "Flushed batch");
        report.record_flush(written);
        Ok(())
    }

    pub async fn run_sequential(
        &self,
        from: Height,
        to: Height,
        monikers: &MonikerMap,
    ) -> BackfillResult<BackfillReport> {
        let chunk = self.config.chunk_heights.max(1) as Height;
        let mut buffer = RowBuffer::new(self.config.sequential_flush);
        let mut report = BackfillReport::default();

        let mut start = from + 1;
        while start <= to {
            let end = (start + chunk - 1).min(to);
            for height in start..=end {
                report.heights += 1;
                let Some(rows) = block_rows(self.source.as_ref(), height, monikers).await else {
                    report.skipped += 1;
                    continue;
                };
                report.blocks += 1;
                if let Some(batch) = buffer.push(rows) {
                    self.flush(batch, &mut report).await?;
                }
            }
            self.flush(buffer.take(), &mut report).await?;
            info!(
                chunk_start = start,
                chunk_end = end,
                rows = report.written.rows,
                "Backfill chunk done"
            );
            start = end + 1;
        }
        Ok(report)
    }

    /// Fan out fetches to `workers` tasks and fan rows back in to this task,
    /// the only writer.
    pub async fn run_parallel(
        &self,
        from: Height,
        to: Height,
        monikers: Arc<MonikerMap>,
    ) -> BackfillResult<BackfillReport> {
        let capacity = self.config.queue_capacity.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Height>(capacity);
        let (out_tx, mut out_rx) = mpsc::channel::<BlockOutcome>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker in 0..self.config.workers.max(1) {
            let jobs = Arc::clone(&job_rx);
            let results = out_tx.clone();
            let source = Arc::clone(&self.source);
            let monikers = Arc::clone(&monikers);
            workers.spawn(async move {
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some(height) = next else { break };
                    let outcome = match block_rows(source.as_ref(), height, &monikers).await {
                        Some(rows) => BlockOutcome::Rows(rows),
                        None => BlockOutcome::Dropped,
                    };
                    if results.send(outcome).await.is_err() {
                        break;
                    }
                }
                debug!(worker, "Backfill worker done");
            });
        }
        drop(out_tx);

        let producer = tokio::spawn(async move {
            for height in (from + 1)..=to {
                if job_tx.send(height).await.is_err() {
                    break;
                }
            }
        });

        let mut report = BackfillReport::default();
        let written = self.drain_results(&mut out_rx, &mut report).await;

        if written.is_err() {
            producer.abort();
            workers.abort_all();
        }
        drop(out_rx);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!(error = %e, "Backfill worker panicked");
                }
            }
        }
        written.map(|()| report)
    }

    async fn drain_results(
        &self,
        results: &mut mpsc::Receiver<BlockOutcome>,
        report: &mut BackfillReport,
    ) -> BackfillResult<()> {
        let mut buffer = RowBuffer::new(self.config.parallel_flush);
        while let Some(outcome) = results.recv().await {
            report.heights += 1;
            match outcome {
                BlockOutcome::Rows(rows) => {
                    report.blocks += 1;
                    if let Some(batch) = buffer.push(rows) {
                        self.flush(batch, report).await?;
                    }
                }
                BlockOutcome::Dropped => report.skipped += 1,
            }
        }
        self.flush(buffer.take(), report).await
    }
}
