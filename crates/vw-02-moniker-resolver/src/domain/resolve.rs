//! Pure priority merge of the three name sources.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Moniker, MonikerMap, UNKNOWN_MONIKER};
use std::collections::HashMap;

/// `{address, name}` pair published by a directory or the genesis file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub address: Address,
    #[serde(default)]
    pub name: Moniker,
}

impl DirectoryEntry {
    pub fn new(address: impl Into<Address>, name: impl Into<Moniker>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

fn index(entries: &[DirectoryEntry]) -> HashMap<&str, &str> {
    entries
        .iter()
        .filter(|e| !e.name.trim().is_empty())
        .map(|e| (e.address.as_str(), e.name.trim()))
        .collect()
}

/// Build a fresh map for the `active` addresses.
///
/// Names come from `directory` first, then `genesis`, then `"unknown"`.
/// Addresses not in `active` never appear, whatever the other sources say.
/// Blank names count as absent.
pub fn resolve(
    active: &[Address],
    directory: &[DirectoryEntry],
    genesis: &[DirectoryEntry],
) -> MonikerMap {
    let directory = index(directory);
    let genesis = index(genesis);

    active
        .iter()
        .map(|address| {
            let name = directory
                .get(address.as_str())
                .or_else(|| genesis.get(address.as_str()))
                .copied()
                .unwrap_or(UNKNOWN_MONIKER);
            (address.clone(), name.to_string())
        })
        .collect()
}

/// Entries of `current` whose address is absent from `previous`, sorted by
/// address.
pub fn newly_added(previous: &MonikerMap, current: &MonikerMap) -> Vec<(Address, Moniker)> {
    let mut added: Vec<(Address, Moniker)> = current
        .iter()
        .filter(|(address, _)| !previous.contains_key(*address))
        .map(|(a, m)| (a.clone(), m.clone()))
        .collect();
    added.sort();
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(addrs: &[&str]) -> Vec<Address> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_priority_directory_then_genesis_then_unknown() {
        let directory = vec![DirectoryEntry::new("g1a", "Alpha (valopers)")];
        let genesis = vec![
            DirectoryEntry::new("g1a", "alpha-genesis"),
            DirectoryEntry::new("g1b", "beta-genesis"),
        ];

        let map = resolve(&active(&["g1a", "g1b", "g1c"]), &directory, &genesis);

        assert_eq!(map["g1a"], "Alpha (valopers)");
        assert_eq!(map["g1b"], "beta-genesis");
        assert_eq!(map["g1c"], "unknown");
    }

    #[test]
    fn test_inactive_addresses_are_excluded() {
        let directory = vec![DirectoryEntry::new("g1gone", "Retired")];
        let genesis = vec![DirectoryEntry::new("g1old", "Old")];

        let map = resolve(&active(&["g1a"]), &directory, &genesis);

        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("g1gone"));
        assert!(!map.contains_key("g1old"));
    }

    #[test]
    fn test_blank_directory_name_falls_through() {
        let directory = vec![DirectoryEntry::new("g1a", "   ")];
        let genesis = vec![DirectoryEntry::new("g1a", "from-genesis")];

        let map = resolve(&active(&["g1a"]), &directory, &genesis);
        assert_eq!(map["g1a"], "from-genesis");
    }

    #[test]
    fn test_newly_added_diff() {
        let previous = resolve(&active(&["g1a", "g1b"]), &[], &[]);
        let current = resolve(
            &active(&["g1b", "g1c", "g1d"]),
            &[DirectoryEntry::new("g1c", "Charlie")],
            &[],
        );

        let added = newly_added(&previous, &current);
        assert_eq!(
            added,
            vec![
                ("g1c".to_string(), "Charlie".to_string()),
                ("g1d".to_string(), "unknown".to_string()),
            ]
        );
    }
}
