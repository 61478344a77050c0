//! Mailbox connection capability.
//!
//! The sync layer talks to mail servers only through [`Connector`] and
//! [`MailboxConnection`], so tests can script a server in-process.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;

use crate::account::AccountConfig;
use crate::record::Uid;

/// Errors raised by a mailbox connection.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// Network I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host name is not usable for TLS verification.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(String),

    /// The server did not send the expected greeting.
    #[error("IMAP server sent no greeting")]
    MissingGreeting,

    /// Login was refused.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The connection ended or was used after it ended.
    #[error("connection closed")]
    Closed,

    /// The account asks for a transport that is not offered.
    #[error("security mode '{0}' is not supported")]
    UnsupportedSecurity(&'static str),

    /// The server rejected a command (`NO` / `BAD`).
    #[error("command rejected: {0}")]
    Command(String),

    /// The server sent something the client could not understand.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl MailboxError {
    /// Whether the connection is unusable after this error.
    ///
    /// A rejected command only aborts the current cycle; everything else
    /// sends the account back through reconnect.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Command(_))
    }
}

/// Search criteria understood by every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Messages dated on or after the given day.
    Since(NaiveDate),
    /// Messages without the `\Seen` flag.
    Unseen,
}

impl SearchCriteria {
    /// IMAP `SEARCH` syntax for this criteria.
    #[must_use]
    pub fn to_imap(&self) -> String {
        match self {
            Self::Since(date) => format!("SINCE {}", date.format("%-d-%b-%Y")),
            Self::Unseen => "UNSEEN".to_string(),
        }
    }
}

/// One half of a fetched message.
///
/// Attributes and body of the same message share a sequence number; the
/// fetch pipeline joins them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// Structural attributes of a message.
    Attributes {
        /// Sequence number of the message in this fetch.
        seq: u32,
        /// Mailbox-scoped identifier.
        uid: Uid,
    },
    /// Full raw body of a message, if the server returned one.
    Body {
        /// Sequence number of the message in this fetch.
        seq: u32,
        /// Raw RFC 5322 bytes.
        raw: Option<Vec<u8>>,
    },
}

/// Outcome of one IDLE wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// The server reported new mail; carries the new message count.
    NewMail(u32),
    /// Nothing happened before the timeout.
    Timeout,
}

/// An authenticated connection to one account.
#[async_trait]
pub trait MailboxConnection: Send {
    /// Selects the mailbox subsequent commands operate on.
    async fn open_mailbox(&mut self, mailbox: &str) -> Result<(), MailboxError>;

    /// Returns the identifiers matching `criteria`, ascending.
    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>, MailboxError>;

    /// Streams attributes and raw bodies for `uids` without setting `\Seen`.
    ///
    /// The stream ends once every requested message has been delivered.
    fn fetch<'a>(&'a mut self, uids: &'a [Uid])
    -> BoxStream<'a, Result<FetchEvent, MailboxError>>;

    /// Adds the `\Seen` flag to a message.
    async fn mark_seen(&mut self, uid: Uid) -> Result<(), MailboxError>;

    /// Whether the server offers push notification (IMAP IDLE).
    fn supports_idle(&self) -> bool;

    /// Waits for new mail, up to `timeout`.
    async fn idle(&mut self, timeout: Duration) -> Result<IdleEvent, MailboxError>;

    /// Ends the session politely.
    async fn logout(&mut self) -> Result<(), MailboxError> {
        Ok(())
    }
}

/// Opens authenticated connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects and logs in to the account's server.
    async fn connect(
        &self,
        account: &AccountConfig,
    ) -> Result<Box<dyn MailboxConnection>, MailboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_criteria_imap_syntax() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap_or_default();
        assert_eq!(SearchCriteria::Since(date).to_imap(), "SINCE 4-Jul-2025");
        assert_eq!(SearchCriteria::Unseen.to_imap(), "UNSEEN");
    }

    #[test]
    fn test_only_command_errors_are_recoverable() {
        assert!(!MailboxError::Command("NO".into()).is_fatal());
        assert!(MailboxError::Closed.is_fatal());
        assert!(MailboxError::Auth("bad".into()).is_fatal());
        assert!(MailboxError::Protocol("?".into()).is_fatal());
    }
}
