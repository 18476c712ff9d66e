//! Store domain: chunk planning, reporting periods and aggregate rows

pub mod aggregates;
pub mod chunking;
pub mod period;
