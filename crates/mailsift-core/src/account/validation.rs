//! Startup validation of account configuration.

use std::collections::HashSet;

use super::model::{AccountConfig, Security};

/// Validation error for account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account id is empty.
    EmptyId,
    /// Another account already uses this id.
    DuplicateId,
    /// IMAP host is empty.
    EmptyHost,
    /// IMAP port is invalid.
    InvalidPort,
    /// IMAP username is empty.
    EmptyUsername,
    /// No password in the configuration or the keyring.
    MissingPassword,
    /// Plaintext connections are refused.
    InsecureConnection,
    /// Mailbox name is empty.
    EmptyMailbox,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyId => "Account id is required",
            Self::DuplicateId => "Account id is used more than once",
            Self::EmptyHost => "IMAP server is required",
            Self::InvalidPort => "IMAP port must be 1-65535",
            Self::EmptyUsername => "IMAP username is required",
            Self::MissingPassword => "IMAP password is required",
            Self::InsecureConnection => "Unencrypted connections are not supported",
            Self::EmptyMailbox => "Mailbox name is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::DuplicateId => "id",
            Self::EmptyHost => "host",
            Self::InvalidPort => "port",
            Self::EmptyUsername => "username",
            Self::MissingPassword => "password",
            Self::InsecureConnection => "security",
            Self::EmptyMailbox => "mailbox",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a single account configuration.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_account(account: &AccountConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if account.id.as_str().trim().is_empty() {
        errors.push(ValidationError::EmptyId);
    }
    if account.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if account.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if account.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if account.password().is_empty() {
        errors.push(ValidationError::MissingPassword);
    }
    if account.security == Security::None {
        errors.push(ValidationError::InsecureConnection);
    }
    if account.mailbox.trim().is_empty() {
        errors.push(ValidationError::EmptyMailbox);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate every account, including id uniqueness across the set.
///
/// # Errors
///
/// Returns the failing account ids paired with their errors, in
/// configuration order.
pub fn validate_accounts(
    accounts: &[AccountConfig],
) -> Result<(), Vec<(String, Vec<ValidationError>)>> {
    let mut seen = HashSet::new();
    let mut failures = Vec::new();

    for account in accounts {
        let mut errors = validate_account(account).err().unwrap_or_default();
        if !seen.insert(account.id.as_str()) {
            errors.push(ValidationError::DuplicateId);
        }
        if !errors.is_empty() {
            failures.push((account.id.to_string(), errors));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
