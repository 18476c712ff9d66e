//! Error types for the backfill engine

use shared_types::Height;
use thiserror::Error;
use vw_03_participation_store::StoreError;

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("Invalid range: to ({to}) is below from ({from})")]
    InvalidRange { from: Height, to: Height },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The blocking write task panicked or was cancelled.
    #[error("Writer task failed: {0}")]
    Writer(String),
}

pub type BackfillResult<T> = Result<T, BackfillError>;
