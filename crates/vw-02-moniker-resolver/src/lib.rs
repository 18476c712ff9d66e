//! # vw-02-moniker-resolver
//!
//! Maps validator addresses to human-readable names.
//!
//! ## Overview
//!
//! Each refresh cycle builds a brand-new `MonikerMap` from three sources and
//! swaps it into the shared [`MonikerBook`] under the write lock:
//!
//! ```text
//!   ValidatorSetSource ──(required)──┐
//!   ValidatorDirectory ──(1st name)──┼──→ resolve() ──→ MonikerBook::replace()
//!   GenesisSource      ──(2nd name)──┘                        │
//!                                                             └──→ added validators
//! ```
//!
//! ## Resolution Order
//!
//! 1. Only addresses in the active validator set are tracked at all.
//! 2. Name from the on-chain validator directory.
//! 3. Name from the genesis validator list.
//! 4. Literal `"unknown"`.
//!
//! ## Failure Model
//!
//! If the active set cannot be fetched (after retries) the cycle is
//! abandoned and the previous map stays in place. Directory and genesis
//! failures only degrade names.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::memory::{StaticDirectory, StaticGenesis, StaticValidatorSet};
pub use adapters::rpc::{FileGenesis, RpcGenesis, RpcValidatorSet, ValopersDirectory};
pub use domain::book::MonikerBook;
pub use domain::resolve::{newly_added, resolve, DirectoryEntry};
pub use error::{ResolverError, ResolverResult};
pub use ports::inbound::{MonikerResolverApi, RefreshOutcome};
pub use ports::outbound::{GenesisSource, ValidatorDirectory, ValidatorSetSource};
pub use service::MonikerResolver;
