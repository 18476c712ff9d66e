//! Driven Port (SPI) consumed by the collector and the backfill engine

use crate::error::BlockSourceResult;
use async_trait::async_trait;
use shared_types::{BlockCommit, Height};
use std::sync::Arc;

/// Read access to the chain's block stream.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Height of the chain tip.
    async fn latest_height(&self) -> BlockSourceResult<Height>;

    /// Commit summary of block `height`.
    ///
    /// Returns `Ok(None)` when the block has no last-commit (e.g. height 1);
    /// that is "no participation data", not an error.
    async fn block(&self, height: Height) -> BlockSourceResult<Option<BlockCommit>>;
}

#[async_trait]
impl<T: BlockSource + ?Sized> BlockSource for Arc<T> {
    async fn latest_height(&self) -> BlockSourceResult<Height> {
        (**self).latest_height().await
    }

    async fn block(&self, height: Height) -> BlockSourceResult<Option<BlockCommit>> {
        (**self).block(height).await
    }
}
