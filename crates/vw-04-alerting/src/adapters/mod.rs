//! Notification sink adapters

pub mod log_sink;
pub mod persisting;
pub mod recording;
