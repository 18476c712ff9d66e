//! # Monitor Runtime
//!
//! The Validator-Watch executable. Loads configuration, wires the subsystem
//! crates together and keeps their long-lived tasks alive.
//!
//! ## Tasks
//!
//! | Task | Crate | Period |
//! |------|-------|--------|
//! | Real-time collector | vw-05 | continuous (idle poll 3 s) |
//! | Moniker refresher | vw-02 | 5 min |
//! | Missed-block poller | vw-04 | 20 s |
//! | Metrics updater | vw-telemetry | 5 min |
//! | Pruner | vw-03 | daily, when `retention_days > 0` |
//! | Report loops | vw-07 | one per user, daily |
//!
//! Every task except the report loops runs under [`supervisor::supervise`]:
//! a panic is logged and the task restarts after 5 s. Report loops isolate
//! each send themselves.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod runtime;
pub mod supervisor;
pub mod tasks;

pub use config::{ConfigError, MonitorConfig};
pub use runtime::{open_store, render_report, run_backfill, save_schedule, MonitorRuntime};
pub use supervisor::{supervise, SupervisorExit, DEFAULT_RESTART_DELAY};
