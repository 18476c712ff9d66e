//! # vw-05-realtime-collector
//!
//! Single control loop that advances from the last stored height to the
//! chain tip, persisting one participation row per known validator per block
//! and raising liveness alerts along the way.
//!
//! ## State Machine
//!
//! ```text
//!             latest > cursor
//!   ┌──────┐ ───────────────→ ┌─────────────┐
//!   │ Idle │                  │ CatchingUp  │── fetch (cursor, latest] in order
//!   └──────┘ ←─────────────── └─────────────┘
//!             cursor = latest
//! ```
//!
//! ## Guarantees
//!
//! - The cursor starts at `MAX(block_height)` from the store, or at the live
//!   tip when the store is empty. It never moves backwards.
//! - Heights are processed strictly in increasing order, one at a time.
//! - A height whose block cannot be fetched is skipped, not retried.
//! - Every `refresh_every` processed heights the moniker map is refreshed and
//!   new validators are announced.
//!
//! Running a backfill over a range the collector is also writing is an
//! operator error; nothing here prevents it.

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::CollectorConfig;
pub use domain::{CollectorProgress, CollectorState, StepOutcome};
pub use error::{CollectorError, CollectorResult};
pub use service::RealtimeCollector;
