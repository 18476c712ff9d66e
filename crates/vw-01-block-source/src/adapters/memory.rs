//! Scripted in-memory block source.
//!
//! Used by unit and integration tests across the workspace. The tip can be
//! set directly or scripted as a queue of successive responses (including
//! failures); individual heights can be made to fail.

use crate::error::{BlockSourceError, BlockSourceResult};
use crate::ports::BlockSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use shared_types::{BlockCommit, Height};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Default)]
struct State {
    tip: Height,
    scripted: VecDeque<Option<Height>>,
    blocks: HashMap<Height, BlockCommit>,
    failing: HashSet<Height>,
    fetched: Vec<Height>,
    latest_calls: usize,
}

/// In-memory [`BlockSource`] with a scriptable tip.
#[derive(Default)]
pub struct MemoryBlockSource {
    state: Mutex<State>,
}

impl MemoryBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source whose tip is `tip` and which has a block at every height
    /// `1..=tip`, each signed by `signers` and proposed by the first signer.
    pub fn with_chain(tip: Height, signers: &[&str]) -> Self {
        let source = Self::new();
        for height in 1..=tip {
            source.insert(Self::make_block(height, signers, false));
        }
        source.set_tip(tip);
        source
    }

    /// Deterministic block fixture: block time is one second per height
    /// after a fixed epoch.
    pub fn make_block(height: Height, signers: &[&str], has_txs: bool) -> BlockCommit {
        BlockCommit {
            height,
            time: Self::block_time(height),
            proposer: signers.first().map(|s| s.to_string()).unwrap_or_default(),
            has_txs,
            precommits: signers.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Block time used by [`make_block`](Self::make_block).
    pub fn block_time(height: Height) -> DateTime<Utc> {
        let epoch = Utc
            .with_ymd_and_hms(2025, 7, 14, 0, 0, 0)
            .single()
            .unwrap_or_default();
        epoch + Duration::seconds(height)
    }

    pub fn insert(&self, block: BlockCommit) {
        self.state.lock().blocks.insert(block.height, block);
    }

    pub fn set_tip(&self, tip: Height) {
        self.state.lock().tip = tip;
    }

    /// Queue tip responses served before falling back to the fixed tip.
    /// `None` entries produce an RPC error.
    pub fn script_latest(&self, responses: impl IntoIterator<Item = Option<Height>>) {
        self.state.lock().scripted.extend(responses);
    }

    /// Make `block(height)` fail with an RPC error.
    pub fn fail_height(&self, height: Height) {
        self.state.lock().failing.insert(height);
    }

    /// Heights requested through `block()`, in call order.
    pub fn fetched(&self) -> Vec<Height> {
        self.state.lock().fetched.clone()
    }

    pub fn latest_calls(&self) -> usize {
        self.state.lock().latest_calls
    }
}

#[async_trait]
impl BlockSource for MemoryBlockSource {
    async fn latest_height(&self) -> BlockSourceResult<Height> {
        let mut state = self.state.lock();
        state.latest_calls += 1;
        match state.scripted.pop_front() {
            Some(Some(height)) => {
                state.tip = height;
                Ok(height)
            }
            Some(None) => Err(BlockSourceError::Rpc {
                code: -1,
                message: "scripted outage".into(),
            }),
            None => Ok(state.tip),
        }
    }

    async fn block(&self, height: Height) -> BlockSourceResult<Option<BlockCommit>> {
        let mut state = self.state.lock();
        state.fetched.push(height);
        if state.failing.contains(&height) {
            return Err(BlockSourceError::Rpc {
                code: -32603,
                message: format!("failed to load block {height}"),
            });
        }
        if height > state.tip {
            return Err(BlockSourceError::Unavailable { height });
        }
        Ok(state.blocks.get(&height).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_tip_then_fixed() {
        let source = MemoryBlockSource::new();
        source.set_tip(5);
        source.script_latest([Some(7), None]);

        assert_eq!(source.latest_height().await.unwrap(), 7);
        assert!(source.latest_height().await.is_err());
        assert_eq!(source.latest_height().await.unwrap(), 7);
        assert_eq!(source.latest_calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_and_missing_heights() {
        let source = MemoryBlockSource::with_chain(3, &["g1a", "g1b"]);
        source.fail_height(2);

        assert!(source.block(1).await.unwrap().is_some());
        assert!(source.block(2).await.is_err());
        assert!(matches!(
            source.block(4).await,
            Err(BlockSourceError::Unavailable { height: 4 })
        ));
        assert_eq!(source.fetched(), vec![1, 2, 4]);
    }
}
