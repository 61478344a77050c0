//! Mail server access.
//!
//! Defines the mailbox capability the sync layer depends on and its IMAP
//! implementation.

mod imap;
mod mailbox;

pub use imap::{ImapConnection, ImapConnector, create_tls_connector};
pub use mailbox::{
    Connector, FetchEvent, IdleEvent, MailboxConnection, MailboxError, SearchCriteria,
};
