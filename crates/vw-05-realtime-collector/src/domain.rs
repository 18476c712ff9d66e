//! Collector state and per-iteration outcomes.

use shared_types::Height;

/// Where the loop stands relative to the chain tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Not yet initialized.
    Starting,
    /// Cursor behind the tip; blocks `(cursor, target]` are being processed.
    CatchingUp { cursor: Height, target: Height },
    /// Cursor at the tip; polling.
    Idle { cursor: Height },
}

impl CollectorState {
    /// State implied by a cursor and an observed tip.
    pub fn from_heights(cursor: Height, latest: Height) -> Self {
        if latest > cursor {
            CollectorState::CatchingUp {
                cursor,
                target: latest,
            }
        } else {
            CollectorState::Idle { cursor }
        }
    }

    pub fn cursor(&self) -> Option<Height> {
        match self {
            CollectorState::Starting => None,
            CollectorState::CatchingUp { cursor, .. } | CollectorState::Idle { cursor } => {
                Some(*cursor)
            }
        }
    }
}

/// Published after each iteration for metrics and health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorProgress {
    pub state: CollectorState,
    pub latest: Option<Height>,
}

impl Default for CollectorProgress {
    fn default() -> Self {
        Self {
            state: CollectorState::Starting,
            latest: None,
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Latest-height query failed.
    RpcError,
    /// Tip not past the cursor.
    Idle,
    /// Cursor advanced to `cursor`.
    Advanced {
        cursor: Height,
        processed: u64,
        skipped: u64,
    },
}
