//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::resolve::DirectoryEntry;
use crate::error::ResolverResult;
use async_trait::async_trait;
use shared_types::Address;

/// Currently active validator set.
#[async_trait]
pub trait ValidatorSetSource: Send + Sync {
    async fn active_validators(&self) -> ResolverResult<Vec<Address>>;
}

/// On-chain registry where operators publish their validator's name.
///
/// Implementations walk every page of the registry.
#[async_trait]
pub trait ValidatorDirectory: Send + Sync {
    async fn registered(&self) -> ResolverResult<Vec<DirectoryEntry>>;
}

/// Validator list of the genesis document.
#[async_trait]
pub trait GenesisSource: Send + Sync {
    async fn genesis_validators(&self) -> ResolverResult<Vec<DirectoryEntry>>;
}
