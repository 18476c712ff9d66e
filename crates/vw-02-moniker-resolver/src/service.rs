//! Moniker Resolver service.

use crate::domain::book::MonikerBook;
use crate::domain::resolve::{newly_added, resolve};
use crate::error::ResolverResult;
use crate::ports::inbound::{MonikerResolverApi, RefreshOutcome};
use crate::ports::outbound::{GenesisSource, ValidatorDirectory, ValidatorSetSource};
use async_trait::async_trait;
use shared_types::MonikerMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Builds and publishes the `MonikerMap`.
pub struct MonikerResolver<V, D, G>
where
    V: ValidatorSetSource,
    D: ValidatorDirectory,
    G: GenesisSource,
{
    validators: Arc<V>,
    directory: Arc<D>,
    genesis: Arc<G>,
    book: MonikerBook,
    /// Held from build to publish so a slow build never overwrites a newer map.
    refreshing: Mutex<()>,
}

impl<V, D, G> MonikerResolver<V, D, G>
where
    V: ValidatorSetSource,
    D: ValidatorDirectory,
    G: GenesisSource,
{
    pub fn new(validators: Arc<V>, directory: Arc<D>, genesis: Arc<G>) -> Self {
        Self::with_book(validators, directory, genesis, MonikerBook::new())
    }

    pub fn with_book(
        validators: Arc<V>,
        directory: Arc<D>,
        genesis: Arc<G>,
        book: MonikerBook,
    ) -> Self {
        Self {
            validators,
            directory,
            genesis,
            book,
            refreshing: Mutex::new(()),
        }
    }

    /// Shared handle readers should hold on to.
    pub fn book(&self) -> MonikerBook {
        self.book.clone()
    }

    /// Build a fresh map without publishing it.
    pub async fn build(&self) -> ResolverResult<MonikerMap> {
        let active = self.validators.active_validators().await?;

        let directory = self.directory.registered().await.unwrap_or_else(|e| {
            warn!(error = %e, "Validator directory unavailable, using genesis names only");
            Vec::new()
        });
        let genesis = self.genesis.genesis_validators().await.unwrap_or_else(|e| {
            warn!(error = %e, "Genesis validators unavailable");
            Vec::new()
        });

        Ok(resolve(&active, &directory, &genesis))
    }
}

#[async_trait]
impl<V, D, G> MonikerResolverApi for MonikerResolver<V, D, G>
where
    V: ValidatorSetSource + 'static,
    D: ValidatorDirectory + 'static,
    G: GenesisSource + 'static,
{
    async fn refresh(&self) -> ResolverResult<RefreshOutcome> {
        let _guard = self.refreshing.lock().await;
        let fresh = match self.build().await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, kept = self.book.len(), "Moniker refresh abandoned, keeping previous map");
                return Err(e);
            }
        };

        let total = fresh.len();
        let previous = self.book.replace(fresh);
        let current = self.book.snapshot();

        // The first load has nothing to diff against.
        let added = if previous.is_empty() {
            Vec::new()
        } else {
            newly_added(&previous, &current)
        };
        let mut removed: Vec<_> = previous
            .keys()
            .filter(|a| !current.contains_key(*a))
            .cloned()
            .collect();
        removed.sort();

        info!(
            total,
            added = added.len(),
            removed = removed.len(),
            "Moniker map refreshed"
        );
        Ok(RefreshOutcome {
            added,
            removed,
            total,
        })
    }

    fn snapshot(&self) -> Arc<MonikerMap> {
        self.book.snapshot()
    }
}
