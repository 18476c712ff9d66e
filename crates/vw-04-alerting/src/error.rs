//! Error types for the alerting subsystem

use thiserror::Error;
use vw_03_participation_store::StoreError;

/// Notification and rule-evaluation errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The sink could not deliver the message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Reading aggregates or writing the alert log failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for alerting operations
pub type NotifyResult<T> = Result<T, NotifyError>;
