//! Scripted mailbox, classifier, index and notifier used by the
//! integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::Notify;
use tokio::time::Instant;

use mailsift_core::classify::{Classifier, ClassifyError};
use mailsift_core::index::{IndexError, SearchFilter, SearchIndex, SearchPage};
use mailsift_core::notify::{Notifier, NotifyError};
use mailsift_core::record::{DocumentId, EmailRecord, MimeParser, Uid};
use mailsift_core::service::{
    Connector, FetchEvent, IdleEvent, MailboxConnection, MailboxError, SearchCriteria,
};
use mailsift_core::{AccountConfig, PipelineContext, SyncSettings};

/// A message held by a [`MockMailbox`].
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub raw: Option<Vec<u8>>,
    pub seen: bool,
}

/// Everything a [`MockMailbox`] records or replays.
#[derive(Debug, Default)]
pub struct MailboxState {
    pub messages: BTreeMap<Uid, StoredMessage>,
    pub idle: bool,
    pub idle_events: VecDeque<Result<IdleEvent, MailboxError>>,
    pub connect_failures: usize,
    pub fetch_failures: usize,
    pub unseen_search_failures: usize,
    pub connects: Vec<(Instant, AccountConfig)>,
    pub fetches: Vec<Vec<Uid>>,
    pub searches: Vec<SearchCriteria>,
    pub marked_seen: Vec<Uid>,
}

/// Server side of one scripted account.
#[derive(Debug, Default)]
pub struct MockMailbox {
    state: Mutex<MailboxState>,
    wake: Notify,
}

impl MockMailbox {
    pub fn new(idle: bool) -> Arc<Self> {
        let mailbox = Self::default();
        mailbox.lock().idle = idle;
        Arc::new(mailbox)
    }

    pub fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap()
    }

    pub fn add(&self, uid: Uid, raw: Vec<u8>) {
        self.insert(uid, Some(raw), false);
    }

    pub fn add_seen(&self, uid: Uid, raw: Vec<u8>) {
        self.insert(uid, Some(raw), true);
    }

    pub fn add_without_body(&self, uid: Uid) {
        self.insert(uid, None, false);
    }

    fn insert(&self, uid: Uid, raw: Option<Vec<u8>>, seen: bool) {
        self.lock().messages.insert(uid, StoredMessage { raw, seen });
    }

    /// Queues the result of the next IDLE wait.
    pub fn push_idle(&self, event: Result<IdleEvent, MailboxError>) {
        self.lock().idle_events.push_back(event);
        self.wake.notify_one();
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.lock().connects.iter().map(|(at, _)| *at).collect()
    }

    pub fn connected_configs(&self) -> Vec<AccountConfig> {
        self.lock().connects.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches.len()
    }

    pub fn searches(&self) -> Vec<SearchCriteria> {
        self.lock().searches.clone()
    }

    pub fn marked_seen(&self) -> Vec<Uid> {
        self.lock().marked_seen.clone()
    }

    pub fn is_seen(&self, uid: Uid) -> bool {
        self.lock().messages.get(&uid).is_some_and(|m| m.seen)
    }
}

/// Routes each account id to its [`MockMailbox`].
#[derive(Default)]
pub struct MockConnector {
    mailboxes: HashMap<String, Arc<MockMailbox>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, account: &str, mailbox: &Arc<MockMailbox>) -> Self {
        self.mailboxes.insert(account.to_string(), Arc::clone(mailbox));
        self
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        account: &AccountConfig,
    ) -> Result<Box<dyn MailboxConnection>, MailboxError> {
        let mailbox = self
            .mailboxes
            .get(account.id.as_str())
            .cloned()
            .ok_or_else(|| MailboxError::Auth("unknown account".to_string()))?;

        let refused = {
            let mut state = mailbox.lock();
            state.connects.push((Instant::now(), account.clone()));
            let refused = state.connect_failures > 0;
            state.connect_failures = state.connect_failures.saturating_sub(1);
            refused
        };
        if refused {
            return Err(MailboxError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }

        Ok(Box::new(MockConnection { mailbox }))
    }
}

struct MockConnection {
    mailbox: Arc<MockMailbox>,
}

#[async_trait]
impl MailboxConnection for MockConnection {
    async fn open_mailbox(&mut self, _mailbox: &str) -> Result<(), MailboxError> {
        Ok(())
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>, MailboxError> {
        let mut state = self.mailbox.lock();
        state.searches.push(*criteria);
        if *criteria == SearchCriteria::Unseen && state.unseen_search_failures > 0 {
            state.unseen_search_failures -= 1;
            return Err(MailboxError::Command("SEARCH rejected".to_string()));
        }
        let uids = state
            .messages
            .iter()
            .filter(|(_, m)| match criteria {
                SearchCriteria::Since(_) => true,
                SearchCriteria::Unseen => !m.seen,
            })
            .map(|(uid, _)| *uid)
            .collect();
        Ok(uids)
    }

    fn fetch<'a>(
        &'a mut self,
        uids: &'a [Uid],
    ) -> BoxStream<'a, Result<FetchEvent, MailboxError>> {
        let mut state = self.mailbox.lock();
        state.fetches.push(uids.to_vec());

        if state.fetch_failures > 0 {
            state.fetch_failures -= 1;
            return stream::iter(vec![Err(MailboxError::Protocol(
                "truncated FETCH response".to_string(),
            ))])
            .boxed();
        }

        let mut events = Vec::new();
        for (seq, uid) in (1_u32..).zip(uids) {
            let Some(message) = state.messages.get(uid) else {
                continue;
            };
            let attributes = Ok(FetchEvent::Attributes { seq, uid: *uid });
            let body = Ok(FetchEvent::Body {
                seq,
                raw: message.raw.clone(),
            });
            // Servers do not guarantee which half arrives first.
            if seq % 2 == 0 {
                events.extend([body, attributes]);
            } else {
                events.extend([attributes, body]);
            }
        }
        stream::iter(events).boxed()
    }

    async fn mark_seen(&mut self, uid: Uid) -> Result<(), MailboxError> {
        let mut state = self.mailbox.lock();
        let Some(message) = state.messages.get_mut(&uid) else {
            return Err(MailboxError::Command(format!("no message {uid}")));
        };
        message.seen = true;
        state.marked_seen.push(uid);
        Ok(())
    }

    fn supports_idle(&self) -> bool {
        self.mailbox.lock().idle
    }

    async fn idle(&mut self, _timeout: Duration) -> Result<IdleEvent, MailboxError> {
        loop {
            let notified = self.mailbox.wake.notified();
            let next = self.mailbox.lock().idle_events.pop_front();
            if let Some(event) = next {
                return event;
            }
            notified.await;
        }
    }
}

/// Classifier answering from a script, then with a fixed label.
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<String, ClassifyError>>>,
    fallback: Result<String, ClassifyError>,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedClassifier {
    pub fn always(label: &str) -> Arc<Self> {
        Self::scripted(Vec::new(), Ok(label.to_string()))
    }

    pub fn failing(err: ClassifyError) -> Arc<Self> {
        Self::scripted(Vec::new(), Err(err))
    }

    pub fn scripted(
        script: Vec<Result<String, ClassifyError>>,
        fallback: Result<String, ClassifyError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Time and subject of every call.
    pub fn calls(&self) -> Vec<(Instant, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, subject: &str, _body: &str) -> Result<String, ClassifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), subject.to_string()));
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// In-memory index; upserts of the listed uids fail.
#[derive(Default)]
pub struct MemoryIndex {
    docs: Mutex<BTreeMap<String, EmailRecord>>,
    failing: HashSet<Uid>,
    upserts: Mutex<usize>,
}

impl MemoryIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(uids: &[Uid]) -> Arc<Self> {
        Arc::new(Self {
            failing: uids.iter().copied().collect(),
            ..Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn upserts(&self) -> usize {
        *self.upserts.lock().unwrap()
    }

    pub fn record(&self, id: &str) -> Option<EmailRecord> {
        self.docs.lock().unwrap().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.docs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        Ok(())
    }

    async fn upsert(&self, id: &DocumentId, record: &EmailRecord) -> Result<(), IndexError> {
        *self.upserts.lock().unwrap() += 1;
        if self.failing.contains(&record.uid) {
            return Err(IndexError::Corrupt {
                id: id.to_string(),
                reason: "rejected".to_string(),
            });
        }
        self.docs
            .lock()
            .unwrap()
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter) -> Result<SearchPage, IndexError> {
        let mut emails: Vec<EmailRecord> = self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|r| filter.account.as_deref().is_none_or(|a| r.account.as_str() == a))
            .filter(|r| filter.category.is_none_or(|c| r.category == c))
            .cloned()
            .collect();
        emails.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(SearchPage {
            total: emails.len() as u64,
            page: filter.page,
            limit: filter.limit,
            emails,
        })
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<EmailRecord>, IndexError> {
        Ok(self.record(id.as_str()))
    }
}

/// Notifier remembering what it was sent.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailRecord>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<EmailRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, record: &EmailRecord) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A TLS account named `id` on a fictional host.
pub fn account(id: &str) -> AccountConfig {
    AccountConfig::new(id, "imap.example.com", format!("{id}@example.com"), "secret")
}

/// Pipeline collaborators with default settings.
pub fn context(
    classifier: Arc<dyn Classifier>,
    index: Arc<dyn SearchIndex>,
    notifiers: Vec<Arc<dyn Notifier>>,
) -> Arc<PipelineContext> {
    Arc::new(PipelineContext::new(
        Arc::new(MimeParser),
        classifier,
        index,
        notifiers,
        &SyncSettings::default(),
    ))
}

/// A plain-text message dated now.
pub fn message(subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: Ada Lovelace <ada@example.com>\r\n\
         To: me@example.com\r\n\
         Subject: {subject}\r\n\
         Date: {}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         {body}\r\n",
        Utc::now().to_rfc2822()
    )
    .into_bytes()
}

/// Sleeps in virtual time until `done` holds, for at most `limit`.
pub async fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    done()
}
