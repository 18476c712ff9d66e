//! Rolling participation over the last `W` observed blocks.

use crate::domain::messages;
use shared_types::{Address, Height, Notification, ParticipationRecord};
use std::collections::{HashMap, VecDeque};

/// Per-validator sliding window with last-alerted-height debounce.
///
/// A validator whose window is below 100% is reported at most once per
/// `size` blocks: only when `last_alerted < height - size`.
#[derive(Debug)]
pub struct ParticipationWindow {
    size: usize,
    history: HashMap<Address, VecDeque<(Height, bool)>>,
    last_alerted: HashMap<Address, Height>,
}

impl ParticipationWindow {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            history: HashMap::new(),
            last_alerted: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Feed the rows written for one block.
    ///
    /// Validators absent from `records` are forgotten.
    pub fn observe(&mut self, records: &[ParticipationRecord]) -> Vec<Notification> {
        let mut alerts = Vec::new();
        let span = self.size as Height;

        for record in records {
            let window = self.history.entry(record.address.clone()).or_default();
            window.push_back((record.block_height, record.participated));
            while window.len() > self.size {
                window.pop_front();
            }

            let signed = window.iter().filter(|(_, p)| *p).count();
            if signed == window.len() {
                continue;
            }

            let height = record.block_height;
            let due = self
                .last_alerted
                .get(&record.address)
                .map_or(true, |&last| last < height - span);
            if !due {
                continue;
            }

            let start = window.front().map_or(height, |(h, _)| *h);
            self.last_alerted.insert(record.address.clone(), height);
            alerts.push(messages::low_participation(
                &record.address,
                &record.moniker,
                signed,
                window.len(),
                start,
                height,
            ));
        }

        if !records.is_empty() {
            self.history
                .retain(|address, _| records.iter().any(|r| &r.address == address));
        }
        alerts
    }
}
