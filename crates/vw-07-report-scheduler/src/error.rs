//! Error types for the report scheduler

use thiserror::Error;
use vw_03_participation_store::StoreError;
use vw_04_alerting::NotifyError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid report time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("No schedule stored for user {0}")]
    UnknownUser(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] NotifyError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
