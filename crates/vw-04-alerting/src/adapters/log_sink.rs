//! Sink that writes notifications to the tracing log.

use crate::error::NotifyResult;
use crate::ports::NotificationSink;
use async_trait::async_trait;
use shared_types::{Notification, Severity};
use tracing::{error, info, warn};

/// Logs every notification at a level matching its severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, n: &Notification) -> NotifyResult<()> {
        match n.severity {
            Severity::Critical => error!(
                kind = ?n.kind,
                address = n.address(),
                moniker = n.moniker(),
                start_height = n.start_height,
                end_height = n.end_height,
                "{}", n.message
            ),
            Severity::Warning => warn!(
                kind = ?n.kind,
                address = n.address(),
                moniker = n.moniker(),
                "{}", n.message
            ),
            Severity::Info | Severity::Resolved => info!(
                kind = ?n.kind,
                address = n.address(),
                moniker = n.moniker(),
                "{}", n.message
            ),
        }
        Ok(())
    }

    async fn deliver_report(&self, user_id: &str, report: &str) -> NotifyResult<()> {
        info!(user_id, "Daily report\n{}", report);
        Ok(())
    }
}
