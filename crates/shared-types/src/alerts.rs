//! # Alert Notifications
//!
//! Abstract notification events produced by the alert rule engine and the
//! report scheduler. Delivery (chat platforms, webhooks) lives outside the
//! core and consumes these values through a sink port.

use crate::entities::{Address, Height, Moniker};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Resolved,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Chain tip has not advanced past the stall threshold.
    ChainStalled,
    /// Chain tip advanced again after a stall.
    ChainRestored,
    /// The RPC endpoint could not report the latest height.
    RpcUnreachable,
    /// An address joined the active validator set.
    NewValidator,
    /// Daily count of missed blocks crossed a threshold.
    MissedBlocks,
    /// Rolling participation over the window dropped below 100%.
    LowParticipation,
}

/// The validator a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRef {
    pub address: Address,
    pub moniker: Moniker,
}

/// A notification-worthy event.
///
/// `start_height`/`end_height` delimit the observation the alert refers to;
/// together with the subject and severity they form the alert's idempotency
/// key in the alert log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub subject: Option<ValidatorRef>,
    pub start_height: Height,
    pub end_height: Height,
}

impl Notification {
    /// Chain-level notification with no validator subject.
    pub fn chain(
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        height: Height,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            subject: None,
            start_height: height,
            end_height: height,
        }
    }

    /// Notification about a single validator.
    pub fn validator(
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        address: impl Into<Address>,
        moniker: impl Into<Moniker>,
        start_height: Height,
        end_height: Height,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            subject: Some(ValidatorRef {
                address: address.into(),
                moniker: moniker.into(),
            }),
            start_height,
            end_height,
        }
    }

    /// Subject address, empty for chain-level notifications.
    pub fn address(&self) -> &str {
        self.subject.as_ref().map(|s| s.address.as_str()).unwrap_or("")
    }

    /// Subject moniker, empty for chain-level notifications.
    pub fn moniker(&self) -> &str {
        self.subject.as_ref().map(|s| s.moniker.as_str()).unwrap_or("")
    }
}
