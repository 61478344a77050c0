//! # mailsift-core
//!
//! Mailbox synchronization and classification pipeline for `mailsift`.
//!
//! This crate provides:
//! - Account configuration, validation and keyring credentials
//! - IMAP connections with IDLE or polling fallback
//! - Record construction from raw RFC 822 messages
//! - Classification with retry and fallback
//! - A searchable `SQLite` index of classified records
//! - Slack and webhook notifications for actionable mail
//! - Supervised per-account connection loops

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod classify;
mod error;
pub mod index;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod service;
mod settings;
pub mod sync;

pub use account::credentials;
pub use account::{
    AccountConfig, AccountId, CredentialError, CredentialResult, Security, ValidationError,
    ValidationResult, validate_account, validate_accounts,
};
pub use classify::{
    ClassificationGate, Classifier, ClassifyError, OllamaClassifier, OllamaConfig,
};
pub use error::{Error, Result};
pub use index::{IndexError, SearchFilter, SearchIndex, SearchPage, SqliteIndex};
pub use notify::{Notifier, NotifyError, SlackNotifier, WebhookNotifier};
pub use pipeline::{CycleKind, CycleReport, FetchPipeline, PipelineContext, ProcessingQueue};
pub use record::{Category, DocumentId, EmailRecord, MessageParser, MimeParser, Uid};
pub use service::{Connector, ImapConnector, MailboxConnection, MailboxError};
pub use settings::{SettingsError, SyncSettings};
pub use sync::{ConnectionState, MonitorMode, SyncHandle, SyncOrchestrator};
