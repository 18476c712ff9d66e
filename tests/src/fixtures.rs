//! Shared fixtures for the integration flows.

use chrono::NaiveDate;
use shared_types::Height;
use std::sync::Arc;
use vw_01_block_source::MemoryBlockSource;
use vw_02_moniker_resolver::{MonikerResolver, StaticDirectory, StaticGenesis, StaticValidatorSet};

pub const VALIDATORS: [&str; 3] = ["g1alpha", "g1bravo", "g1charlie"];

pub type TestResolver = MonikerResolver<StaticValidatorSet, StaticDirectory, StaticGenesis>;

/// Day every fixture block falls on.
pub fn chain_day() -> NaiveDate {
    MemoryBlockSource::block_time(1).date_naive()
}

/// Chain `1..=last` signed by every validator except the `(height, address)`
/// pairs in `misses`. Even heights carry transactions. The tip is set to
/// `tip`.
pub fn chain(last: Height, tip: Height, misses: &[(Height, &str)]) -> MemoryBlockSource {
    let source = MemoryBlockSource::new();
    for height in 1..=last {
        let signers: Vec<&str> = VALIDATORS
            .iter()
            .copied()
            .filter(|v| !misses.contains(&(height, *v)))
            .collect();
        source.insert(MemoryBlockSource::make_block(
            height,
            &signers,
            height % 2 == 0,
        ));
    }
    source.set_tip(tip);
    source
}

/// Alpha and Bravo are registered in the directory, Charlie only in genesis.
pub fn resolver() -> (Arc<StaticValidatorSet>, TestResolver) {
    let set = Arc::new(StaticValidatorSet::new(&VALIDATORS));
    let resolver = MonikerResolver::new(
        Arc::clone(&set),
        Arc::new(StaticDirectory::new(&[
            ("g1alpha", "Alpha"),
            ("g1bravo", "Bravo"),
        ])),
        Arc::new(StaticGenesis::new(&[
            ("g1charlie", "Charlie"),
            ("g1bravo", "Bravo (genesis)"),
        ])),
    );
    (set, resolver)
}
