//! Aggregate rows returned by store queries.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Height, Moniker};

/// Outcome of an upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Statements (and transactions) executed.
    pub statements: usize,
    /// Rows written.
    pub rows: usize,
}

impl WriteReport {
    pub fn merge(&mut self, other: WriteReport) {
        self.statements += other.statements;
        self.rows += other.rows;
    }
}

/// Lowest and highest height recorded in some scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: Height,
    pub max: Height,
}

/// Participation rate of one validator over some scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRate {
    pub address: Address,
    /// Moniker of the most recent row in scope.
    pub moniker: Moniker,
    pub total: u64,
    pub participated: u64,
    /// `participated / total` in percent.
    pub rate: f64,
}

impl ValidatorRate {
    pub fn new(address: Address, moniker: Moniker, total: u64, participated: u64) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            participated as f64 * 100.0 / total as f64
        };
        Self {
            address,
            moniker,
            total,
            participated,
            rate,
        }
    }

    pub fn missed(&self) -> u64 {
        self.total.saturating_sub(self.participated)
    }
}

/// Per-validator count (missed blocks, contributions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorCount {
    pub address: Address,
    pub moniker: Moniker,
    pub count: u64,
}

/// Per-validator percentage of a total (tx contribution share, uptime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorShare {
    pub address: Address,
    pub moniker: Moniker,
    pub percent: f64,
}

/// One persisted alert.
///
/// `(address, level, start_height, end_height)` identifies the alert; a
/// second insert with the same key is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertLogEntry {
    pub address: Address,
    pub moniker: Moniker,
    pub level: String,
    pub start_height: Height,
    pub end_height: Height,
    pub message: String,
    /// RFC 3339 UTC timestamp.
    pub sent_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_and_missed() {
        let rate = ValidatorRate::new("g1a".into(), "A".into(), 200, 190);
        assert!((rate.rate - 95.0).abs() < f64::EPSILON);
        assert_eq!(rate.missed(), 10);
    }

    #[test]
    fn test_rate_of_empty_scope_is_zero() {
        assert_eq!(ValidatorRate::new("g1a".into(), "A".into(), 0, 0).rate, 0.0);
    }
}
