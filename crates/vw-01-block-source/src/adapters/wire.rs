//! Tendermint2 RPC response shapes.
//!
//! Only the fields participation tracking reads are modelled; everything else
//! in the node's response is ignored by serde.

use crate::error::{BlockSourceError, BlockSourceResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared_types::{BlockCommit, Height};

#[derive(Debug, Deserialize)]
pub(crate) struct RpcEnvelope<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl<T> RpcEnvelope<T> {
    pub fn into_result(self) -> BlockSourceResult<T> {
        if let Some(err) = self.error {
            let message = match err.data {
                Some(data) if !data.is_empty() => format!("{}: {}", err.message, data),
                _ => err.message,
            };
            return Err(BlockSourceError::Rpc {
                code: err.code,
                message,
            });
        }
        self.result
            .ok_or_else(|| BlockSourceError::Parse("response missing result".into()))
    }
}

// ---------------------------------------------------------------------------
// /status
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResult {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncInfo {
    pub latest_block_height: String,
}

impl StatusResult {
    pub fn latest_height(&self) -> BlockSourceResult<Height> {
        parse_height(&self.sync_info.latest_block_height)
    }
}

// ---------------------------------------------------------------------------
// /block
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResult {
    pub block: RawBlock,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBlock {
    pub header: RawHeader,
    #[serde(default)]
    pub data: Option<RawData>,
    #[serde(default)]
    pub last_commit: Option<RawCommit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHeader {
    pub height: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub proposer_address: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawData {
    #[serde(default)]
    pub txs: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommit {
    #[serde(default)]
    pub precommits: Option<Vec<Option<RawPrecommit>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPrecommit {
    pub validator_address: String,
}

impl BlockResult {
    /// Convert to the domain summary; `None` when there is no last-commit.
    pub fn into_commit(self) -> BlockSourceResult<Option<BlockCommit>> {
        let RawBlock {
            header,
            data,
            last_commit,
        } = self.block;

        // A present commit with no signatures means every validator missed.
        let precommits: Vec<String> = match last_commit {
            Some(commit) => commit
                .precommits
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(|p| p.validator_address)
                .collect(),
            None => return Ok(None),
        };

        let has_txs = data
            .and_then(|d| d.txs)
            .map(|txs| !txs.is_empty())
            .unwrap_or(false);

        Ok(Some(BlockCommit {
            height: parse_height(&header.height)?,
            time: header.time,
            proposer: header.proposer_address,
            has_txs,
            precommits,
        }))
    }
}

// ---------------------------------------------------------------------------
// /validators
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorsResult {
    #[serde(default)]
    pub validators: Vec<RawValidator>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawValidator {
    pub address: String,
}

// ---------------------------------------------------------------------------
// abci_query
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct AbciQueryResult {
    pub response: AbciResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbciResponse {
    #[serde(rename = "ResponseBase")]
    pub base: AbciResponseBase,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbciResponseBase {
    #[serde(rename = "Error", default)]
    pub error: Option<serde_json::Value>,
    #[serde(rename = "Data", default)]
    pub data: Option<String>,
}

fn parse_height(raw: &str) -> BlockSourceResult<Height> {
    raw.trim()
        .parse::<Height>()
        .map_err(|e| BlockSourceError::Parse(format!("invalid height {raw:?}: {e}")))
}
