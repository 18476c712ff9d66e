//! # Shared Types Crate
//!
//! This crate contains the data model shared by every Validator-Watch
//! subsystem: the per-block participation row, the block commit summary
//! returned by the chain RPC, alert notifications and report schedules.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **One row per (height, address)**: `ParticipationRecord` is keyed by
//!   block height and validator address; re-observation overwrites.
//! - **Rows are built per block**: `records_for_block` produces every row for
//!   one observation point at once, so writers never see half a block.

pub mod alerts;
pub mod entities;

pub use alerts::*;
pub use entities::*;
