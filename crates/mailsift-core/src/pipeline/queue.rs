//! Per-account serial processing queue.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{CycleKind, CycleReport, PipelineContext};
use crate::account::AccountId;
use crate::notify::notify_all;
use crate::record::EmailRecord;
use crate::service::{MailboxConnection, MailboxError};

/// Ordered buffer of records waiting for classification.
///
/// Drained strictly one record at a time with a throttle in between, so
/// an account never has two classifier calls in flight.
pub struct ProcessingQueue {
    account: AccountId,
    pending: VecDeque<EmailRecord>,
    ctx: Arc<PipelineContext>,
}

impl ProcessingQueue {
    /// Creates an empty queue for `account`.
    #[must_use]
    pub const fn new(account: AccountId, ctx: Arc<PipelineContext>) -> Self {
        Self {
            account,
            pending: VecDeque::new(),
            ctx,
        }
    }

    /// Appends records in order.
    pub fn extend(&mut self, records: impl IntoIterator<Item = EmailRecord>) {
        self.pending.extend(records);
    }

    /// Processes every queued record, FIFO.
    ///
    /// Per record: classify, publish, notify if actionable, flag seen on
    /// monitoring cycles, then throttle. A publish failure skips the
    /// notification and the seen flag for that record only.
    ///
    /// # Errors
    ///
    /// Returns the first connection-fatal error hit while flagging
    /// messages. The queue is still drained completely before returning.
    pub async fn drain(
        &mut self,
        conn: &mut dyn MailboxConnection,
        kind: CycleKind,
    ) -> Result<CycleReport, MailboxError> {
        let mut report = CycleReport::default();
        let mut connection_error: Option<MailboxError> = None;

        while let Some(mut record) = self.pending.pop_front() {
            let id = record.document_id();
            record.category = self.ctx.gate.classify(&record.subject, &record.body).await;

            match self.ctx.index.upsert(&id, &record).await {
                Ok(()) => {
                    report.published += 1;
                    info!(id = %id, category = %record.category, "Published");
                    self.after_publish(conn, &record, kind, &mut connection_error)
                        .await;
                }
                Err(err) => {
                    report.publish_failed += 1;
                    warn!(id = %id, error = %err, "Publish failed, record dropped");
                }
            }

            tokio::time::sleep(self.ctx.throttle).await;
        }

        debug!(
            account = %self.account,
            cycle = kind.as_str(),
            published = report.published,
            failed = report.publish_failed,
            "Queue drained"
        );

        connection_error.map_or(Ok(report), Err)
    }

    async fn after_publish(
        &self,
        conn: &mut dyn MailboxConnection,
        record: &EmailRecord,
        kind: CycleKind,
        connection_error: &mut Option<MailboxError>,
    ) {
        if record.category.is_actionable() && !self.ctx.notifiers.is_empty() {
            let notifiers = self.ctx.notifiers.clone();
            let record = record.clone();
            tokio::spawn(async move { notify_all(&notifiers, &record).await });
        }

        if !kind.marks_seen() || connection_error.is_some() {
            return;
        }
        if let Err(err) = conn.mark_seen(record.uid).await {
            warn!(account = %self.account, uid = record.uid, error = %err, "Failed to flag message seen");
            if err.is_fatal() {
                *connection_error = Some(err);
            }
        }
    }
}
