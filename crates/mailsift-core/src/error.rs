//! Error types for mailsift-core.

use thiserror::Error;

use crate::account::{AccountId, ValidationError};
use crate::index::IndexError;
use crate::service::MailboxError;
use crate::settings::SettingsError;

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop synchronization from starting or completing.
///
/// Failures inside the pipeline (classification, publication,
/// notification) are logged and absorbed where they happen and never
/// surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// The account list is empty.
    #[error("no accounts configured")]
    NoAccounts,

    /// One or more accounts failed validation.
    #[error("invalid account configuration: {}", describe_invalid(.0))]
    InvalidAccounts(Vec<(String, Vec<ValidationError>)>),

    /// The sync settings would stall or crash an account.
    #[error("invalid sync settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// The index could not be prepared.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// The first connection of an account failed before its historical
    /// sync completed.
    #[error("initial sync failed for account '{account}': {source}")]
    InitialSync {
        /// Account that failed.
        account: AccountId,
        /// What ended the connection.
        source: MailboxError,
    },

    /// A sync task ended without reporting.
    #[error("sync task for account '{0}' stopped")]
    TaskStopped(AccountId),
}

fn describe_invalid(failures: &[(String, Vec<ValidationError>)]) -> String {
    failures
        .iter()
        .map(|(account, errors)| {
            let reasons: Vec<&str> = errors.iter().map(ValidationError::message).collect();
            format!("{account}: {}", reasons.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_accounts_message() {
        let err = Error::InvalidAccounts(vec![
            (
                "work".to_string(),
                vec![ValidationError::EmptyHost, ValidationError::MissingPassword],
            ),
            ("home".to_string(), vec![ValidationError::EmptyUsername]),
        ]);
        let message = err.to_string();
        assert!(message.contains("work: "));
        assert!(message.contains("home: "));
        assert!(message.contains(ValidationError::EmptyHost.message()));
    }

    #[test]
    fn test_initial_sync_message() {
        let err = Error::InitialSync {
            account: AccountId::new("work"),
            source: MailboxError::Closed,
        };
        assert!(err.to_string().starts_with("initial sync failed for account 'work'"));
    }
}
