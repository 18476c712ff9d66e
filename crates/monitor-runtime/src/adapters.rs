//! Concrete adapter choices for the production wiring.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use vw_01_block_source::RpcClient;
use vw_02_moniker_resolver::{
    DirectoryEntry, FileGenesis, GenesisSource, MonikerResolver, ResolverResult, RpcGenesis,
    RpcValidatorSet, ValopersDirectory,
};
use vw_03_participation_store::SqliteStore;
use vw_04_alerting::{LogSink, PersistingSink};

/// Genesis validators from the node, or from a local file when configured.
pub enum GenesisAdapter {
    Rpc(RpcGenesis),
    File(FileGenesis),
}

impl GenesisAdapter {
    pub fn new(client: Arc<RpcClient>, file: Option<PathBuf>) -> Self {
        match file {
            Some(path) => GenesisAdapter::File(FileGenesis::new(path)),
            None => GenesisAdapter::Rpc(RpcGenesis::new(client)),
        }
    }
}

#[async_trait]
impl GenesisSource for GenesisAdapter {
    async fn genesis_validators(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        match self {
            GenesisAdapter::Rpc(rpc) => rpc.genesis_validators().await,
            GenesisAdapter::File(file) => file.genesis_validators().await,
        }
    }
}

pub type Resolver = MonikerResolver<RpcValidatorSet, ValopersDirectory, GenesisAdapter>;

/// Alerts are logged to the alert table and to the process log.
pub type Sink = PersistingSink<LogSink, SqliteStore>;
