//! Driving Ports (API - Inbound)

use crate::error::ResolverResult;
use async_trait::async_trait;
use shared_types::{Address, Moniker, MonikerMap};
use std::sync::Arc;

/// Result of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Validators present now but absent from the previous snapshot, sorted
    /// by address. Empty on the very first load.
    pub added: Vec<(Address, Moniker)>,
    /// Validators that dropped out of the active set.
    pub removed: Vec<Address>,
    /// Size of the new map.
    pub total: usize,
}

/// Moniker Resolver API
#[async_trait]
pub trait MonikerResolverApi: Send + Sync {
    /// Rebuild the map, swap it in and report what changed.
    async fn refresh(&self) -> ResolverResult<RefreshOutcome>;

    /// Current map. Readers get a consistent snapshot.
    fn snapshot(&self) -> Arc<MonikerMap>;
}
