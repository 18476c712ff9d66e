//! Decorator that appends each alert to the alert log before delivery.

use crate::error::NotifyResult;
use crate::ports::NotificationSink;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use shared_types::Notification;
use std::sync::Arc;
use tracing::{debug, warn};
use vw_03_participation_store::{on_blocking_pool, AlertLogEntry, AlertLogStore};

/// Records every notification in an [`AlertLogStore`], then forwards it.
///
/// A log write failure is logged and does not stop delivery. Reports are
/// forwarded untouched.
pub struct PersistingSink<N, L>
where
    N: NotificationSink,
    L: AlertLogStore,
{
    inner: N,
    log: Arc<L>,
}

impl<N, L> PersistingSink<N, L>
where
    N: NotificationSink,
    L: AlertLogStore,
{
    pub fn new(inner: N, log: Arc<L>) -> Self {
        Self { inner, log }
    }
}

fn entry_for(n: &Notification) -> AlertLogEntry {
    AlertLogEntry {
        address: n.address().to_string(),
        moniker: n.moniker().to_string(),
        level: n.severity.as_str().to_string(),
        start_height: n.start_height,
        end_height: n.end_height,
        message: n.message.clone(),
        sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

#[async_trait]
impl<N, L> NotificationSink for PersistingSink<N, L>
where
    N: NotificationSink,
    L: AlertLogStore + 'static,
{
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        let entry = entry_for(notification);
        match on_blocking_pool(&self.log, move |log| log.record_alert(&entry)).await {
            Ok(true) => {}
            Ok(false) => debug!(
                address = notification.address(),
                level = %notification.severity,
                "Alert already logged"
            ),
            Err(e) => warn!(error = %e, "Failed to record alert"),
        }
        self.inner.notify(notification).await
    }

    async fn deliver_report(&self, user_id: &str, report: &str) -> NotifyResult<()> {
        self.inner.deliver_report(user_id, report).await
    }
}
