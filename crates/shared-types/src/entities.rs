//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `BlockCommit`, `Address`, `Height`
//! - **Participation**: `ParticipationRecord`, `MonikerMap`
//! - **Reporting**: `ScheduleEntry`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// Block height as reported by the chain RPC.
pub type Height = i64;

/// Bech32 or hex validator address exactly as the RPC renders it.
pub type Address = String;

/// Human-readable validator name.
pub type Moniker = String;

/// Address to display name, one entry per active validator.
pub type MonikerMap = HashMap<Address, Moniker>;

/// Moniker used when no source knows the address.
pub const UNKNOWN_MONIKER: &str = "unknown";

/// Summary of one block as far as participation tracking is concerned.
///
/// `precommits` lists the validators whose signature appears in the block's
/// last-commit set. Absent (null) precommits are already filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCommit {
    /// Height of the block carrying the commit.
    pub height: Height,
    /// Header timestamp.
    pub time: DateTime<Utc>,
    /// Address of the block proposer.
    pub proposer: Address,
    /// Whether the block carries at least one transaction.
    pub has_txs: bool,
    /// Validators that precommitted.
    pub precommits: Vec<Address>,
}

impl BlockCommit {
    /// Set of participating addresses.
    pub fn participants(&self) -> HashSet<&str> {
        self.precommits.iter().map(String::as_str).collect()
    }

    /// The validator credited with a transaction contribution, if any.
    pub fn tx_contributor(&self) -> Option<&str> {
        if self.has_txs {
            Some(self.proposer.as_str())
        } else {
            None
        }
    }

    /// UTC calendar day of the block.
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

// =============================================================================
// CLUSTER B: PARTICIPATION
// =============================================================================

/// One row per (block height, validator address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    /// Calendar day derived from the block time.
    pub date: NaiveDate,
    /// Block height.
    pub block_height: Height,
    /// Validator address.
    pub address: Address,
    /// Moniker at write time (denormalized).
    pub moniker: Moniker,
    /// Whether the validator precommitted this block.
    pub participated: bool,
    /// Whether the validator proposed this block and it carried transactions.
    pub tx_contribution: bool,
}

/// Build one record per currently-known validator for a block.
///
/// Participation is presence in the precommit set. Validators that signed but
/// are not in `monikers` are not tracked.
pub fn records_for_block(block: &BlockCommit, monikers: &MonikerMap) -> Vec<ParticipationRecord> {
    let participants = block.participants();
    let contributor = block.tx_contributor();
    let date = block.date();

    let mut records: Vec<ParticipationRecord> = monikers
        .iter()
        .map(|(address, moniker)| {
            let participated = participants.contains(address.as_str());
            ParticipationRecord {
                date,
                block_height: block.height,
                address: address.clone(),
                moniker: moniker.clone(),
                participated,
                tx_contribution: participated && contributor == Some(address.as_str()),
            }
        })
        .collect();
    records.sort_by(|a, b| a.address.cmp(&b.address));
    records
}

// =============================================================================
// CLUSTER C: REPORTING
// =============================================================================

/// A user's preferred daily report time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Owner of the schedule.
    pub user_id: String,
    /// Local hour (0-23).
    pub hour: u32,
    /// Local minute (0-59).
    pub minute: u32,
    /// IANA timezone name, e.g. `Europe/Paris`.
    pub timezone: String,
}

impl ScheduleEntry {
    pub fn new(
        user_id: impl Into<String>,
        hour: u32,
        minute: u32,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            hour,
            minute,
            timezone: timezone.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn block(has_txs: bool) -> BlockCommit {
        BlockCommit {
            height: 42,
            time: Utc.with_ymd_and_hms(2025, 7, 14, 23, 59, 58).unwrap(),
            proposer: "g1alice".to_string(),
            has_txs,
            precommits: vec!["g1alice".to_string(), "g1bob".to_string()],
        }
    }

    fn monikers() -> MonikerMap {
        [("g1alice", "Alice"), ("g1bob", "Bob"), ("g1carol", "Carol")]
            .into_iter()
            .map(|(a, m)| (a.to_string(), m.to_string()))
            .collect()
    }

    #[test]
    fn test_one_record_per_known_validator() {
        let records = records_for_block(&block(false), &monikers());
        assert_eq!(records.len(), 3);

        let carol = records.iter().find(|r| r.address == "g1carol").unwrap();
        assert!(!carol.participated);
        assert_eq!(carol.moniker, "Carol");
        assert!(records.iter().all(|r| r.block_height == 42));
    }

    #[test]
    fn test_tx_contribution_only_for_proposer_with_txs() {
        let with_txs = records_for_block(&block(true), &monikers());
        let contributors: Vec<_> = with_txs.iter().filter(|r| r.tx_contribution).collect();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].address, "g1alice");

        let without_txs = records_for_block(&block(false), &monikers());
        assert!(without_txs.iter().all(|r| !r.tx_contribution));
    }

    #[test]
    fn test_record_date_comes_from_block_time() {
        let records = records_for_block(&block(false), &monikers());
        let expected = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        assert!(records.iter().all(|r| r.date == expected));
    }

    #[test]
    fn test_unknown_signers_are_not_tracked() {
        let mut b = block(false);
        b.precommits.push("g1stranger".to_string());
        let records = records_for_block(&b, &monikers());
        assert!(records.iter().all(|r| r.address != "g1stranger"));
    }

    #[test]
    fn test_schedule_entry_serde() {
        let entry = ScheduleEntry::new("user-1", 9, 30, "Europe/Paris");
        let json = serde_json::to_string(&entry).unwrap();
        let back: ScheduleEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
