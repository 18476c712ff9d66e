//! # vw-04-alerting
//!
//! Alert Rule Engine: derives notification-worthy events from collector
//! observations and stored aggregates, and hands them to a
//! [`NotificationSink`]. Delivery itself is someone else's job.
//!
//! ## Rules
//!
//! | Rule | Input | Severity |
//! |------|-------|----------|
//! | Stagnation / restoration | latest height over time | CRITICAL / RESOLVED |
//! | RPC unreachable | latest-height errors, debounced | CRITICAL |
//! | New validator | moniker refresh diff | INFO |
//! | Missed blocks today | `missed_counts(today)` | `>= 3` CRITICAL, `== 1` WARNING |
//! | Low rolling participation | last `W` blocks per validator | WARNING |
//!
//! A count of exactly 2 missed blocks is deliberately silent.
//!
//! ## State
//!
//! All debounce state is in memory and owned by the task that evaluates the
//! rule. A restart re-arms every rule.
//!
//! ```text
//!   StagnationMonitor:   Normal ──(no progress > threshold)──→ Stalled
//!                          ↑                                     │
//!                          └──────────(height advances)──────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::log_sink::LogSink;
pub use adapters::persisting::PersistingSink;
pub use adapters::recording::RecordingSink;
pub use domain::debounce::RpcErrorDebouncer;
pub use domain::messages;
pub use domain::missed::{classify_missed, MissedBlockTracker};
pub use domain::stagnation::{StagnationMonitor, StallState, StallTransition};
pub use domain::window::ParticipationWindow;
pub use error::{NotifyError, NotifyResult};
pub use ports::NotificationSink;
pub use service::{dispatch, MissedBlockWatcher};
