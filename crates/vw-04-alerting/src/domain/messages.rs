//! Notification builders. One function per rule so wording lives in one place.

use shared_types::{AlertKind, Height, Notification, Severity};
use std::time::Duration;

fn minutes(d: Duration) -> u64 {
    d.as_secs() / 60
}

pub fn chain_stalled(height: Height, stalled_for: Duration) -> Notification {
    Notification::chain(
        AlertKind::ChainStalled,
        Severity::Critical,
        format!(
            "🚨 Chain stalled at height {height}: no new block for {} min",
            minutes(stalled_for)
        ),
        height,
    )
}

pub fn chain_restored(stalled_at: Height, height: Height, stalled_for: Duration) -> Notification {
    let mut n = Notification::chain(
        AlertKind::ChainRestored,
        Severity::Resolved,
        format!(
            "✅ Chain activity restored: height {height} after {} min stalled at {stalled_at}",
            minutes(stalled_for)
        ),
        height,
    );
    n.start_height = stalled_at;
    n
}

pub fn rpc_unreachable(error: &str, last_known: Height) -> Notification {
    Notification::chain(
        AlertKind::RpcUnreachable,
        Severity::Critical,
        format!(
            "⚠️ Error when querying latest block height: {error}\nLast known block height: {last_known}"
        ),
        last_known,
    )
}

pub fn new_validator(address: &str, moniker: &str, height: Height) -> Notification {
    Notification::validator(
        AlertKind::NewValidator,
        Severity::Info,
        format!("✅ **New Validator detected**: {moniker} ({address})"),
        address,
        moniker,
        height,
        height,
    )
}

pub fn missed_blocks(
    severity: Severity,
    address: &str,
    moniker: &str,
    missed: u64,
    start_height: Height,
    end_height: Height,
) -> Notification {
    let emoji = if severity == Severity::Critical { "🚨" } else { "⚠️" };
    Notification::validator(
        AlertKind::MissedBlocks,
        severity,
        format!("{emoji} {severity}\n addr: {address}\n moniker: {moniker}\n missed {missed} blocks today"),
        address,
        moniker,
        start_height,
        end_height,
    )
}

pub fn low_participation(
    address: &str,
    moniker: &str,
    signed: usize,
    observed: usize,
    start_height: Height,
    end_height: Height,
) -> Notification {
    let rate = if observed == 0 {
        0.0
    } else {
        signed as f64 * 100.0 / observed as f64
    };
    Notification::validator(
        AlertKind::LowParticipation,
        Severity::Warning,
        format!(
            "⚠️ {moniker} ({address}) signed {signed}/{observed} blocks between {start_height} and {end_height} ({rate:.2}%)"
        ),
        address,
        moniker,
        start_height,
        end_height,
    )
}
