//! RPC-backed name sources.
//!
//! - [`RpcValidatorSet`]: `/validators`
//! - [`ValopersDirectory`]: paginated `Render("?page=N")` of the valopers realm
//!   via `abci_query vm/qeval`
//! - [`RpcGenesis`] / [`FileGenesis`]: the genesis `validators` array

use crate::domain::resolve::DirectoryEntry;
use crate::error::{ResolverError, ResolverResult};
use crate::ports::outbound::{GenesisSource, ValidatorDirectory, ValidatorSetSource};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use shared_types::Address;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vw_01_block_source::{RetryPolicy, RpcClient};

/// Realm whose `Render` lists registered validator operators.
pub const DEFAULT_VALOPERS_REALM: &str = "gno.land/r/gnops/valopers";

/// Upper bound on directory pages walked in one refresh.
const MAX_DIRECTORY_PAGES: u32 = 500;

lazy_static! {
    static ref VALOPER_LINK: Regex =
        Regex::new(r"\[\s*([^\]]+?)\s*]\(/r/gnops/valopers:([a-z0-9]+)\)")
            .expect("valoper link pattern");
}

// =============================================================================
// ACTIVE SET
// =============================================================================

/// Active set from `/validators`, retried with doubling delay.
pub struct RpcValidatorSet {
    client: Arc<RpcClient>,
    retry: RetryPolicy,
}

impl RpcValidatorSet {
    pub fn new(client: Arc<RpcClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ValidatorSetSource for RpcValidatorSet {
    async fn active_validators(&self) -> ResolverResult<Vec<Address>> {
        let validators = self
            .retry
            .run("fetch validators", || self.client.validators())
            .await
            .map_err(|e| ResolverError::ActiveSetUnavailable(e.to_string()))?;
        Ok(validators.into_iter().map(|v| v.address).collect())
    }
}

// =============================================================================
// VALOPERS DIRECTORY
// =============================================================================

/// Extract `[Name](/r/gnops/valopers:ADDRESS)` links from one rendered page.
pub fn parse_valopers_page(markdown: &str) -> Vec<DirectoryEntry> {
    VALOPER_LINK
        .captures_iter(markdown)
        .map(|c| DirectoryEntry::new(&c[2], &c[1]))
        .collect()
}

/// Walks the valopers realm's rendered pages until one yields no entry.
pub struct ValopersDirectory {
    client: Arc<RpcClient>,
    realm: String,
}

impl ValopersDirectory {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self::with_realm(client, DEFAULT_VALOPERS_REALM)
    }

    pub fn with_realm(client: Arc<RpcClient>, realm: impl Into<String>) -> Self {
        Self {
            client,
            realm: realm.into(),
        }
    }

    fn render_expr(&self, page: u32) -> String {
        format!(r#"{}.Render("?page={}")"#, self.realm, page)
    }
}

#[async_trait]
impl ValidatorDirectory for ValopersDirectory {
    async fn registered(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        let mut all = Vec::new();

        for page in 1..=MAX_DIRECTORY_PAGES {
            let expr = self.render_expr(page);
            let raw = self.client.abci_query("vm/qeval", expr.as_bytes()).await?;
            let entries = parse_valopers_page(&String::from_utf8_lossy(&raw));
            if entries.is_empty() {
                break;
            }
            debug!(page, count = entries.len(), "Fetched valopers page");
            all.extend(entries);
        }

        info!(total = all.len(), "Fetched validator directory");
        Ok(all)
    }
}

// =============================================================================
// GENESIS
// =============================================================================

/// Locate the `validators` array of a genesis document.
///
/// An object's own `validators` key wins over anything nested in it; nested
/// values are then searched depth-first.
pub fn find_genesis_validators(doc: &Value) -> Option<&Vec<Value>> {
    match doc {
        Value::Object(map) => {
            if let Some(Value::Array(list)) = map.get("validators") {
                return Some(list);
            }
            map.values().find_map(find_genesis_validators)
        }
        Value::Array(items) => items.iter().find_map(find_genesis_validators),
        _ => None,
    }
}

/// `{address, name}` pairs of the genesis validator list.
pub fn genesis_entries(doc: &Value) -> ResolverResult<Vec<DirectoryEntry>> {
    let list = find_genesis_validators(doc).ok_or_else(|| ResolverError::Malformed {
        what: "genesis",
        reason: "no validators array".into(),
    })?;

    Ok(list
        .iter()
        .filter_map(|v| {
            let address = v.get("address")?.as_str()?;
            let name = v.get("name").and_then(Value::as_str).unwrap_or_default();
            Some(DirectoryEntry::new(address, name))
        })
        .collect())
}

/// Genesis fetched from the node's `/genesis` endpoint.
pub struct RpcGenesis {
    client: Arc<RpcClient>,
}

impl RpcGenesis {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenesisSource for RpcGenesis {
    async fn genesis_validators(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        let doc = self.client.genesis().await?;
        genesis_entries(&doc)
    }
}

/// Genesis read from a local JSON file.
pub struct FileGenesis {
    path: PathBuf,
}

impl FileGenesis {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GenesisSource for FileGenesis {
    async fn genesis_validators(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ResolverError::GenesisFile {
                path: self.path.display().to_string(),
                source,
            })?;
        let doc: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Genesis file is not valid JSON");
            ResolverError::Malformed {
                what: "genesis",
                reason: e.to_string(),
            }
        })?;
        genesis_entries(&doc)
    }
}
