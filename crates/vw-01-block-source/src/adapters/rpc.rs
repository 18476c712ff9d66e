//! HTTP adapter for a Tendermint2 (gno.land) RPC node.

use super::wire::{AbciQueryResult, BlockResult, RpcEnvelope, StatusResult, ValidatorsResult};
use crate::error::{BlockSourceError, BlockSourceResult};
use crate::ports::BlockSource;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Address, BlockCommit, Height};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Connection settings for the RPC adapter.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL, e.g. `https://rpc.gno.land:443`.
    pub endpoint: String,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:26657".to_string(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// One active validator as reported by `/validators`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcValidator {
    pub address: Address,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Serialize)]
struct AbciQueryParams<'a> {
    path: &'a str,
    data: String,
}

/// RPC client implementing [`BlockSource`].
///
/// Also serves the validator-set, genesis and ABCI endpoints that the moniker
/// resolver adapts into its own ports.
pub struct RpcClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Build a client with the configured timeouts.
    pub fn new(config: RpcConfig) -> BlockSourceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> BlockSourceResult<T> {
        let url = format!("{}/{}", self.endpoint, route);
        trace!(url = %url, "RPC GET");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        // Tendermint returns JSON-RPC error bodies with 500; let the envelope decide.
        if !status.is_success() && status.as_u16() != 500 {
            return Err(BlockSourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| BlockSourceError::Parse(e.to_string()))?;
        envelope.into_result()
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> BlockSourceResult<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        trace!(method, "RPC call");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| BlockSourceError::Parse(e.to_string()))?;
        envelope.into_result()
    }

    /// Current active validator set.
    pub async fn validators(&self) -> BlockSourceResult<Vec<RpcValidator>> {
        let result: ValidatorsResult = self.get("validators", &[]).await?;
        debug!(count = result.validators.len(), "Fetched active validator set");
        Ok(result
            .validators
            .into_iter()
            .map(|v| RpcValidator { address: v.address })
            .collect())
    }

    /// Raw `/genesis` result document.
    pub async fn genesis(&self) -> BlockSourceResult<serde_json::Value> {
        self.get("genesis", &[]).await
    }

    /// Run an ABCI query and return the decoded response payload.
    pub async fn abci_query(&self, path: &str, data: &[u8]) -> BlockSourceResult<Vec<u8>> {
        let params = AbciQueryParams {
            path,
            data: BASE64.encode(data),
        };
        let result: AbciQueryResult = self.call("abci_query", params).await?;
        let base = result.response.base;

        if let Some(err) = base.error.filter(|e| !e.is_null()) {
            return Err(BlockSourceError::Rpc {
                code: 0,
                message: format!("abci query {path} failed: {err}"),
            });
        }

        match base.data {
            Some(encoded) if !encoded.is_empty() => BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| BlockSourceError::Parse(format!("abci data: {e}"))),
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl BlockSource for RpcClient {
    async fn latest_height(&self) -> BlockSourceResult<Height> {
        let status: StatusResult = self.get("status", &[]).await?;
        status.latest_height()
    }

    async fn block(&self, height: Height) -> BlockSourceResult<Option<BlockCommit>> {
        let result: BlockResult = self
            .get("block", &[("height", height.to_string())])
            .await?;
        result.into_commit()
    }
}
