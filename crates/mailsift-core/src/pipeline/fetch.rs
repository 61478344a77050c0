//! Batch fetch and record construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{CycleKind, CycleReport, PipelineContext, ProcessingQueue};
use crate::account::AccountConfig;
use crate::record::{EmailRecord, Uid};
use crate::service::{FetchEvent, MailboxConnection, MailboxError};

/// Join state of one message: attributes and body arrive separately.
#[derive(Debug, Default)]
struct MessageJoin {
    uid: Option<Uid>,
    body: Option<Option<Vec<u8>>>,
}

impl MessageJoin {
    /// Returns the uid and body once both halves have arrived.
    fn complete(&mut self) -> Option<(Uid, Option<Vec<u8>>)> {
        if self.uid.is_some() && self.body.is_some() {
            Some((self.uid.take()?, self.body.take()?))
        } else {
            None
        }
    }
}

/// Fetches batches for one account and feeds its processing queue.
pub struct FetchPipeline {
    account: Arc<AccountConfig>,
    ctx: Arc<PipelineContext>,
    queue: ProcessingQueue,
}

impl FetchPipeline {
    /// Creates the pipeline of `account`, with its own empty queue.
    #[must_use]
    pub fn new(account: Arc<AccountConfig>, ctx: Arc<PipelineContext>) -> Self {
        let queue = ProcessingQueue::new(account.id.clone(), Arc::clone(&ctx));
        Self {
            account,
            ctx,
            queue,
        }
    }

    /// Fetches `uids`, builds their records and processes them.
    ///
    /// Records are queued only after the whole batch has been fetched, and
    /// the call returns only after the queue is drained. Messages with an
    /// empty or unreadable body are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch stream fails, in which case nothing
    /// from the batch is processed, or if the connection dies while
    /// flagging messages.
    pub async fn run(
        &mut self,
        conn: &mut dyn MailboxConnection,
        uids: &[Uid],
        kind: CycleKind,
    ) -> Result<CycleReport, MailboxError> {
        if uids.is_empty() {
            return Ok(CycleReport::default());
        }

        let account = &self.account.id;
        info!(account = %account, cycle = kind.as_str(), count = uids.len(), "Fetching messages");

        let mut joins: BTreeMap<u32, MessageJoin> = BTreeMap::new();
        let mut records = Vec::with_capacity(uids.len());
        let mut dropped = 0;

        {
            let mut events = conn.fetch(uids);
            while let Some(event) = events.next().await {
                let seq = match event? {
                    FetchEvent::Attributes { seq, uid } => {
                        joins.entry(seq).or_default().uid = Some(uid);
                        seq
                    }
                    FetchEvent::Body { seq, raw } => {
                        joins.entry(seq).or_default().body = Some(raw);
                        seq
                    }
                };

                let Some((uid, raw)) = joins.get_mut(&seq).and_then(MessageJoin::complete) else {
                    continue;
                };
                joins.remove(&seq);

                match self.build(uid, raw.as_deref()) {
                    Some(record) => records.push(record),
                    None => dropped += 1,
                }
            }
        }

        for (seq, join) in &joins {
            warn!(account = %account, seq, uid = ?join.uid, "Incomplete fetch response, message dropped");
            dropped += 1;
        }

        let built = records.len();
        debug!(account = %account, built, dropped, "Fetch batch complete");
        self.queue.extend(records);

        let mut report = self.queue.drain(conn, kind).await?;
        report.built = built;
        report.dropped = dropped;
        Ok(report)
    }

    fn build(&self, uid: Uid, raw: Option<&[u8]>) -> Option<EmailRecord> {
        let account = &self.account.id;
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            warn!(account = %account, uid, "Message has no body, skipped");
            return None;
        };

        let parsed = match self.ctx.parser.parse(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(account = %account, uid, error = %err, "Failed to parse message, skipped");
                return None;
            }
        };

        match self
            .ctx
            .builder
            .build(account, &self.account.mailbox, uid, &parsed)
        {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(account = %account, uid, error = %err, "Record dropped");
                None
            }
        }
    }
}
