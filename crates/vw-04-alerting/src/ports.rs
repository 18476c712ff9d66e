//! Driven port towards whatever delivers notifications (chat bots, webhooks).

use crate::error::NotifyResult;
use async_trait::async_trait;
use shared_types::Notification;
use std::sync::Arc;

/// Notification sink.
///
/// Callers log failures and carry on; a sink must not block beyond one
/// delivery attempt.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver an alert. Message, severity, address and moniker are all on
    /// the notification.
    async fn notify(&self, notification: &Notification) -> NotifyResult<()>;

    /// Deliver a formatted daily report to one user.
    async fn deliver_report(&self, user_id: &str, report: &str) -> NotifyResult<()>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        (**self).notify(notification).await
    }

    async fn deliver_report(&self, user_id: &str, report: &str) -> NotifyResult<()> {
        (**self).deliver_report(user_id, report).await
    }
}
