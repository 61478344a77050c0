//! Fetch, build, classify and publish.
//!
//! [`FetchPipeline`] turns a batch of identifiers into records and hands
//! them to the account's [`ProcessingQueue`], which classifies and
//! publishes them one at a time.

mod fetch;
mod queue;

use std::sync::Arc;
use std::time::Duration;

pub use fetch::FetchPipeline;
pub use queue::ProcessingQueue;

use tokio::sync::Semaphore;

use crate::classify::{ClassificationGate, Classifier};
use crate::index::SearchIndex;
use crate::notify::Notifier;
use crate::record::{MessageParser, MessageRecordBuilder};
use crate::settings::SyncSettings;

/// Why a batch is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// The one-time catch-up over the historical window.
    Historical,
    /// A new-mail or polling cycle during monitoring.
    Monitoring,
}

impl CycleKind {
    /// Whether processed messages get the `\Seen` flag.
    ///
    /// Monitoring searches for unseen mail, so the flag is what keeps a
    /// message from being picked up again.
    #[must_use]
    pub const fn marks_seen(self) -> bool {
        matches!(self, Self::Monitoring)
    }

    /// Name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Monitoring => "monitoring",
        }
    }
}

/// Collaborators shared by every account's pipeline.
pub struct PipelineContext {
    /// Raw message parser.
    pub parser: Arc<dyn MessageParser>,
    /// Record construction settings.
    pub builder: MessageRecordBuilder,
    /// Classifier with retry policy.
    pub gate: ClassificationGate,
    /// Publication target.
    pub index: Arc<dyn SearchIndex>,
    /// Sinks for actionable records.
    pub notifiers: Vec<Arc<dyn Notifier>>,
    /// Pause between two records of the same account.
    pub throttle: Duration,
}

impl PipelineContext {
    /// Wires the collaborators according to `settings`.
    ///
    /// When `classify_concurrency` is set, every account shares one
    /// semaphore capping in-flight classifier calls.
    #[must_use]
    pub fn new(
        parser: Arc<dyn MessageParser>,
        classifier: Arc<dyn Classifier>,
        index: Arc<dyn SearchIndex>,
        notifiers: Vec<Arc<dyn Notifier>>,
        settings: &SyncSettings,
    ) -> Self {
        let mut gate = ClassificationGate::new(classifier, settings.max_classify_attempts);
        if let Some(permits) = settings.classify_concurrency {
            gate = gate.with_limiter(Arc::new(Semaphore::new(permits.max(1))));
        }

        Self {
            parser,
            builder: MessageRecordBuilder::new(settings.body_limit),
            gate,
            index,
            notifiers,
            throttle: settings.throttle(),
        }
    }
}

/// Counters of one fetch-and-process cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records built and queued.
    pub built: usize,
    /// Messages dropped before queueing (empty or unreadable).
    pub dropped: usize,
    /// Records stored in the index.
    pub published: usize,
    /// Records the index refused.
    pub publish_failed: usize,
}
