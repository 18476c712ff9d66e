//! In-memory name sources for tests and offline runs.

use crate::domain::resolve::DirectoryEntry;
use crate::error::{ResolverError, ResolverResult};
use crate::ports::outbound::{GenesisSource, ValidatorDirectory, ValidatorSetSource};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Address;

/// Active set that can be changed between refreshes, or made to fail.
#[derive(Default)]
pub struct StaticValidatorSet {
    active: RwLock<Option<Vec<Address>>>,
}

impl StaticValidatorSet {
    pub fn new(addresses: &[&str]) -> Self {
        let set = Self::default();
        set.set(addresses);
        set
    }

    pub fn set(&self, addresses: &[&str]) {
        *self.active.write() = Some(addresses.iter().map(|a| a.to_string()).collect());
    }

    /// Subsequent fetches fail until [`set`](Self::set) is called again.
    pub fn set_unavailable(&self) {
        *self.active.write() = None;
    }
}

#[async_trait]
impl ValidatorSetSource for StaticValidatorSet {
    async fn active_validators(&self) -> ResolverResult<Vec<Address>> {
        self.active
            .read()
            .clone()
            .ok_or_else(|| ResolverError::ActiveSetUnavailable("static set unavailable".into()))
    }
}

/// Fixed directory.
#[derive(Default)]
pub struct StaticDirectory {
    entries: RwLock<Vec<DirectoryEntry>>,
}

impl StaticDirectory {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: RwLock::new(
                entries
                    .iter()
                    .map(|(a, n)| DirectoryEntry::new(*a, *n))
                    .collect(),
            ),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValidatorDirectory for StaticDirectory {
    async fn registered(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        Ok(self.entries.read().clone())
    }
}

/// Fixed genesis list.
#[derive(Default)]
pub struct StaticGenesis {
    entries: Vec<DirectoryEntry>,
}

impl StaticGenesis {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(a, n)| DirectoryEntry::new(*a, *n))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenesisSource for StaticGenesis {
    async fn genesis_validators(&self) -> ResolverResult<Vec<DirectoryEntry>> {
        Ok(self.entries.clone())
    }
}
