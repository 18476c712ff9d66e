//! # vw-01-block-source
//!
//! Abstraction over the chain RPC used by every other subsystem:
//! "give me the latest height" and "give me block N's commit".
//!
//! ## Overview
//!
//! - **`BlockSource` port**: `latest_height()` and `block(height)`.
//! - **`RpcClient` adapter**: Tendermint2-style JSON-RPC over HTTP with bounded
//!   request and connect timeouts. Also exposes the validator-set, genesis and
//!   ABCI query endpoints consumed by the moniker resolver.
//! - **`RetryPolicy`**: fixed-attempt retries with doubling delay.
//! - **`MemoryBlockSource`**: scripted in-memory source for tests.
//!
//! ## Failure Model
//!
//! Every RPC failure is returned as a `BlockSourceError`; callers retry with
//! backoff and never crash. A block without a last-commit (height 1) is
//! `Ok(None)`, meaning "no participation data".
//!
//! ```text
//! Collector / Backfill ──latest_height()──→ BlockSource ──GET /status──→ RPC
//!                      ──block(h)────────→             ──GET /block───→
//! ```

pub mod adapters;
pub mod error;
pub mod ports;
pub mod retry;

pub use adapters::memory::MemoryBlockSource;
pub use adapters::rpc::{RpcClient, RpcConfig, RpcValidator};
pub use error::{BlockSourceError, BlockSourceResult};
pub use ports::BlockSource;
pub use retry::RetryPolicy;
