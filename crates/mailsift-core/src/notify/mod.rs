//! Notifications for actionable records.
//!
//! Delivery is best-effort: the pipeline logs failures and moves on.

mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

pub use webhook::{SlackNotifier, WebhookNotifier, body_snippet, slack_payload, webhook_payload};

use crate::record::EmailRecord;

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The receiver answered with a non-success status.
    #[error("receiver returned status {0}")]
    Status(u16),
}

/// A notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Delivers a notification about `record`.
    async fn notify(&self, record: &EmailRecord) -> Result<(), NotifyError>;
}

/// Sends `record` to every sink concurrently, logging failures.
pub async fn notify_all(notifiers: &[Arc<dyn Notifier>], record: &EmailRecord) {
    let deliveries = notifiers.iter().map(|notifier| async move {
        if let Err(err) = notifier.notify(record).await {
            warn!(
                notifier = notifier.name(),
                id = %record.document_id(),
                error = %err,
                "Notification failed"
            );
        }
    });
    futures::future::join_all(deliveries).await;
}
