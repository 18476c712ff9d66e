//! Chain stagnation state machine.
//!
//! Progress is measured from the instant the latest height last changed. The
//! first observation only arms the timer.

use shared_types::Height;
use std::time::Duration;
use tokio::time::Instant;

/// Stall state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallState {
    Normal,
    Stalled { at: Height },
}

/// Emitted on a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallTransition {
    /// Normal → Stalled.
    Stalled { height: Height, stalled_for: Duration },
    /// Stalled → Normal.
    Restored {
        stalled_at: Height,
        height: Height,
        stalled_for: Duration,
    },
}

#[derive(Debug)]
pub struct StagnationMonitor {
    threshold: Duration,
    state: StallState,
    last: Option<(Height, Instant)>,
}

impl StagnationMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: StallState::Normal,
            last: None,
        }
    }

    pub fn state(&self) -> StallState {
        self.state
    }

    /// Feed the latest height seen at `now`.
    ///
    /// Returns `Stalled` at most once per stall episode and `Restored`
    /// exactly once when the height next changes.
    pub fn observe(&mut self, height: Height, now: Instant) -> Option<StallTransition> {
        let Some((last_height, changed_at)) = self.last else {
            self.last = Some((height, now));
            return None;
        };

        if height != last_height {
            self.last = Some((height, now));
            return match self.state {
                StallState::Stalled { at } => {
                    self.state = StallState::Normal;
                    Some(StallTransition::Restored {
                        stalled_at: at,
                        height,
                        stalled_for: now.saturating_duration_since(changed_at),
                    })
                }
                StallState::Normal => None,
            };
        }

        let idle = now.saturating_duration_since(changed_at);
        match self.state {
            StallState::Normal if idle > self.threshold => {
                self.state = StallState::Stalled { at: height };
                Some(StallTransition::Stalled {
                    height,
                    stalled_for: idle,
                })
            }
            _ => None,
        }
    }
}
