//! Error types for the collector

use thiserror::Error;
use vw_01_block_source::BlockSourceError;
use vw_03_participation_store::StoreError;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Block source error: {0}")]
    BlockSource(#[from] BlockSourceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type CollectorResult<T> = Result<T, CollectorError>;
