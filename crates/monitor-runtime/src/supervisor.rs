//! Restart-on-panic supervision for long-lived tasks.
//!
//! ```text
//!   factory() ──spawn──→ task ──panic──→ log, sleep restart_delay ──┐
//!      ↑                                                            │
//!      └────────────────────────────────────────────────────────────┘
//!                        task returns  ──→ Finished
//!                        shutdown      ──→ Stopped (task aborted)
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Delay before a crashed task is started again.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(5);

/// How a supervised task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The task returned on its own.
    Finished { restarts: u32 },
    /// Shutdown was signalled.
    Stopped { restarts: u32 },
}

/// Run `factory()` until it returns or shutdown is signalled, restarting it
/// after `restart_delay` whenever it panics.
pub async fn supervise<F, Fut>(
    name: &'static str,
    restart_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut factory: F,
) -> SupervisorExit
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut restarts = 0u32;
    loop {
        if *shutdown.borrow() {
            return SupervisorExit::Stopped { restarts };
        }

        let mut task = tokio::spawn(factory());
        let joined = tokio::select! {
            joined = &mut task => joined,
            _ = shutdown.changed() => {
                task.abort();
                info!(task = name, "Shutdown signal received");
                return SupervisorExit::Stopped { restarts };
            }
        };

        match joined {
            Ok(()) => {
                info!(task = name, "Task finished");
                return SupervisorExit::Finished { restarts };
            }
            Err(e) if e.is_panic() => {
                restarts += 1;
                error!(task = name, restarts, "Task panicked, restarting");
            }
            Err(e) => {
                warn!(task = name, error = %e, "Task cancelled, restarting");
                restarts += 1;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(restart_delay) => {}
            _ = shutdown.changed() => return SupervisorExit::Stopped { restarts },
        }
    }
}
