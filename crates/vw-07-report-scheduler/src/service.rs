//! Per-user report loops.

use crate::adapters::clock::SystemTimeSource;
use crate::domain::report::{format_daily_report, LOW_RATE_THRESHOLD};
use crate::domain::time::{next_occurrence, resolve_timezone, validate_time};
use crate::error::{SchedulerError, SchedulerResult};
use crate::ports::TimeSource;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vw_02_moniker_resolver::MonikerBook;
use vw_03_participation_store::{on_blocking_pool, ParticipationStore, ScheduleStore};
use vw_04_alerting::NotificationSink;

/// Everything a loop needs, shared by all loops.
struct ReportContext<S, N> {
    store: Arc<S>,
    sink: Arc<N>,
    monikers: MonikerBook,
    clock: Arc<dyn TimeSource>,
    threshold: f64,
}

impl<S, N> ReportContext<S, N>
where
    S: ParticipationStore + ScheduleStore + 'static,
    N: NotificationSink,
{
    fn render(&self, date: NaiveDate) -> SchedulerResult<String> {
        let range = self.store.height_range(date)?;
        let rates = self.store.participation_rates(date)?;
        Ok(format_daily_report(
            date,
            range,
            &rates,
            &self.monikers,
            self.threshold,
        ))
    }

    async fn send_report(&self, user_id: &str) -> SchedulerResult<()> {
        let yesterday = self.clock.now().date_naive() - Duration::days(1);
        let (range, rates) = on_blocking_pool(&self.store, move |s| {
            Ok((s.height_range(yesterday)?, s.participation_rates(yesterday)?))
        })
        .await?;
        let report =
            format_daily_report(yesterday, range, &rates, &self.monikers, self.threshold);
        self.sink.deliver_report(user_id, &report).await?;
        info!(user_id, date = %yesterday, "Daily report sent");
        Ok(())
    }
}

/// Stop handle of one live loop. Dropping `stop` closes the channel.
struct UserLoop {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct ReportScheduler<S, N> {
    ctx: Arc<ReportContext<S, N>>,
    loops: Mutex<HashMap<String, UserLoop>>,
}

impl<S, N> ReportScheduler<S, N>
where
    S: ParticipationStore + ScheduleStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, sink: Arc<N>, monikers: MonikerBook) -> Self {
        Self {
            ctx: Arc::new(ReportContext {
                store,
                sink,
                monikers,
                clock: Arc::new(SystemTimeSource),
                threshold: LOW_RATE_THRESHOLD,
            }),
            loops: Mutex::new(HashMap::new()),
        }
    }

    fn map_ctx(self, f: impl FnOnce(&mut ReportContext<S, N>)) -> Self {
        let loops = self.loops;
        let ctx = match Arc::try_unwrap(self.ctx) {
            Ok(mut ctx) => {
                f(&mut ctx);
                Arc::new(ctx)
            }
            Err(shared) => shared,
        };
        Self { ctx, loops }
    }

    /// Replace the wall clock. Call before any loop is started.
    pub fn with_clock(self, clock: Arc<dyn TimeSource>) -> Self {
        self.map_ctx(|ctx| ctx.clock = clock)
    }

    /// Rate at or above which a validator is marked healthy.
    pub fn with_threshold(self, threshold: f64) -> Self {
        self.map_ctx(|ctx| ctx.threshold = threshold)
    }

    /// Start (or restart) the loop for `user_id`.
    ///
    /// Any existing loop for the user is stopped first, under the same lock
    /// that registers the new one.
    pub fn schedule(
        &self,
        user_id: &str,
        hour: u32,
        minute: u32,
        timezone: &str,
    ) -> SchedulerResult<()> {
        validate_time(hour, minute)?;
        let (tz, _) = resolve_timezone(timezone);

        let mut loops = self.loops.lock();
        if let Some(previous) = loops.remove(user_id) {
            drop(previous.stop);
            debug!(user_id, "Closed previous report loop");
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let ctx = Arc::clone(&self.ctx);
        let user = user_id.to_string();
        let task = tokio::spawn(user_loop(ctx, user, hour, minute, tz, stop_rx));
        loops.insert(
            user_id.to_string(),
            UserLoop {
                stop: stop_tx,
                task,
            },
        );
        info!(user_id, hour, minute, timezone = %tz, "Report loop scheduled");
        Ok(())
    }

    /// Start one loop per stored schedule. Invalid entries are skipped.
    pub fn start_all(&self) -> SchedulerResult<usize> {
        let entries = self.ctx.store.list_schedules()?;
        let mut started = 0;
        for entry in entries {
            match self.schedule(&entry.user_id, entry.hour, entry.minute, &entry.timezone) {
                Ok(()) => started += 1,
                Err(e) => warn!(user_id = %entry.user_id, error = %e, "Skipping stored schedule"),
            }
        }
        info!(started, "Report scheduler started");
        Ok(started)
    }

    /// Re-read the user's stored schedule and restart their loop.
    pub fn reload(&self, user_id: &str) -> SchedulerResult<()> {
        let entry = self
            .ctx
            .store
            .schedule_for(user_id)?
            .ok_or_else(|| SchedulerError::UnknownUser(user_id.to_string()))?;
        self.schedule(user_id, entry.hour, entry.minute, &entry.timezone)
    }

    /// Stop the user's loop. Returns whether one was registered.
    pub fn stop(&self, user_id: &str) -> bool {
        self.loops.lock().remove(user_id).is_some()
    }

    pub fn shutdown(&self) {
        let stopped = {
            let mut loops = self.loops.lock();
            let n = loops.len();
            loops.clear();
            n
        };
        info!(stopped, "Report scheduler shut down");
    }

    /// Users with a registered loop, sorted.
    pub fn active_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.loops.lock().keys().cloned().collect();
        users.sort();
        users
    }

    /// Whether the user's registered loop task is still running.
    pub fn is_running(&self, user_id: &str) -> bool {
        self.loops
            .lock()
            .get(user_id)
            .is_some_and(|l| !l.task.is_finished())
    }

    /// Render the summary for `date` without sending it.
    pub fn render(&self, date: NaiveDate) -> SchedulerResult<String> {
        self.ctx.render(date)
    }

    /// Send yesterday's summary to `user_id` now.
    pub async fn send_now(&self, user_id: &str) -> SchedulerResult<()> {
        self.ctx.send_report(user_id).await
    }
}

/// A panic while sending one report is logged; the loop carries on.
async fn user_loop<S, N>(
    ctx: Arc<ReportContext<S, N>>,
    user_id: String,
    hour: u32,
    minute: u32,
    tz: Tz,
    mut stop: oneshot::Receiver<()>,
) where
    S: ParticipationStore + ScheduleStore + 'static,
    N: NotificationSink + 'static,
{
    let mut last_fired: Option<DateTime<Utc>> = None;
    loop {
        let now = ctx.clock.now();
        // The sleep is monotonic, the slot is wall-clock: never pick the
        // slot that just fired again.
        let from = match last_fired {
            Some(fired) => now.max(fired + Duration::seconds(1)),
            None => now,
        };
        let next = match next_occurrence(from, hour, minute, tz) {
            Ok(next) => next,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Cannot compute next report time");
                return;
            }
        };
        let wait = (next - now).to_std().unwrap_or_default();
        info!(
            user_id = %user_id,
            next = %next.with_timezone(&tz),
            wait_secs = wait.as_secs(),
            "Next report scheduled"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                last_fired = Some(next);
                let run_ctx = Arc::clone(&ctx);
                let run_user = user_id.clone();
                let run = tokio::spawn(async move { run_ctx.send_report(&run_user).await });
                match run.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(user_id = %user_id, error = %e, "Daily report failed"),
                    Err(e) => error!(user_id = %user_id, error = %e, "Daily report panicked"),
                }
            }
            _ = &mut stop => {
                info!(user_id = %user_id, "Report loop stopped");
                return;
            }
        }
    }
}
