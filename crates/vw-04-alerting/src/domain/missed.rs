//! Daily missed-block thresholds.

use crate::domain::messages;
use chrono::NaiveDate;
use shared_types::{Address, Notification, Severity};
use std::collections::HashMap;
use vw_03_participation_store::{HeightRange, ValidatorCount};

/// `>= 3` missed blocks is critical, exactly 1 is a warning, 0 and 2 are
/// silent.
pub fn classify_missed(missed: u64) -> Option<Severity> {
    match missed {
        1 => Some(Severity::Warning),
        n if n >= 3 => Some(Severity::Critical),
        _ => None,
    }
}

/// Applies [`classify_missed`] to each poll's counts, remembering what was
/// already reported today so each validator gets each severity once per day.
#[derive(Debug, Default)]
pub struct MissedBlockTracker {
    reported: HashMap<Address, (NaiveDate, Severity)>,
}

impl MissedBlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        date: NaiveDate,
        counts: &[ValidatorCount],
        heights: Option<HeightRange>,
    ) -> Vec<Notification> {
        let (start, end) = heights.map_or((0, 0), |r| (r.min, r.max));
        self.reported.retain(|_, (day, _)| *day == date);

        counts
            .iter()
            .filter_map(|c| {
                let severity = classify_missed(c.count)?;
                if self.reported.get(&c.address) == Some(&(date, severity)) {
                    return None;
                }
                self.reported.insert(c.address.clone(), (date, severity));
                Some(messages::missed_blocks(
                    severity, &c.address, &c.moniker, c.count, start, end,
                ))
            })
            .collect()
    }
}
