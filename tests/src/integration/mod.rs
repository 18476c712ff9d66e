//! Cross-subsystem flows.

pub mod alerting;
pub mod ingest;
pub mod reporting;
