//! Sink that keeps everything it receives. Test double.

use crate::error::{NotifyError, NotifyResult};
use crate::ports::NotificationSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{AlertKind, Notification};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
    reports: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
    changed: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail (after recording it).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn of_kind(&self, kind: AlertKind) -> Vec<Notification> {
        self.notifications
            .lock()
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    /// `(user_id, report)` pairs in delivery order.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().clone()
    }

    /// Resolves after the next notification or report is recorded.
    pub async fn changed(&self) {
        self.changed.notified().await
    }

    fn result(&self) -> NotifyResult<()> {
        self.changed.notify_waiters();
        if self.failing.load(Ordering::SeqCst) {
            Err(NotifyError::Delivery("recording sink set to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        self.notifications.lock().push(notification.clone());
        self.result()
    }

    async fn deliver_report(&self, user_id: &str, report: &str) -> NotifyResult<()> {
        self.reports
            .lock()
            .push((user_id.to_string(), report.to_string()));
        self.result()
    }
}
