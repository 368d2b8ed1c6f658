//! Outbound notifications to the association office.
//!
//! Notification is fire-and-forget everywhere it is used: a failure is
//! logged and never allowed to fail the primary operation. The default
//! sender writes to the log; deployments with a mail relay swap in their
//! own [`Notifier`].

use std::sync::Arc;

use anyhow::Result;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Default sender: emits notifications to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        tracing::info!(title, body, "notification sent");
        Ok(())
    }
}

/// Send a notification, swallowing any failure.
pub fn notify_best_effort(notifier: &Arc<dyn Notifier>, title: &str, body: &str) {
    if let Err(e) = notifier.notify(title, body) {
        tracing::warn!("Notification failed: {}", e);
    }
}
