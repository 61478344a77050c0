//! IMAP passwords kept in the system keyring.
//!
//! An account whose configuration omits `password` gets it from the
//! platform credential store (Secret Service, Keychain or Credential
//! Manager) under the `mailsift` service.

use keyring::Entry;
use tracing::debug;

use super::{AccountConfig, AccountId};

/// Keyring service of every entry.
const SERVICE_NAME: &str = "mailsift";

/// Entry kind of IMAP passwords.
const IMAP_CREDENTIAL: &str = "imap";

/// Keyring access failure.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The platform store refused the operation.
    #[error("Credential store error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result alias for keyring operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Entry name, e.g. `mailsift_imap_work`.
fn credential_key(account_id: &AccountId, credential_type: &str) -> String {
    format!("{SERVICE_NAME}_{credential_type}_{account_id}")
}

/// Saves the IMAP password of `account_id`, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_imap_password(account_id: &AccountId, password: &str) -> CredentialResult<()> {
    let key = credential_key(account_id, IMAP_CREDENTIAL);
    let entry = Entry::new(SERVICE_NAME, &key)?;
    entry.set_password(password)?;
    debug!(account = %account_id, "Stored IMAP password");
    Ok(())
}

/// Looks up the IMAP password of `account_id`.
///
/// A missing entry is `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_imap_password(account_id: &AccountId) -> CredentialResult<Option<String>> {
    let key = credential_key(account_id, IMAP_CREDENTIAL);
    let entry = Entry::new(SERVICE_NAME, &key)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            debug!(account = %account_id, "No IMAP password found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Fills in missing passwords from the keyring.
///
/// Accounts that already carry a password are left untouched. Accounts
/// with no stored entry keep `None`; startup validation rejects them.
///
/// # Errors
///
/// Returns an error if the keyring cannot be read.
pub fn resolve_passwords(accounts: &mut [AccountConfig]) -> CredentialResult<()> {
    for account in accounts.iter_mut().filter(|a| a.password.is_none()) {
        account.password = get_imap_password(&account.id)?;
    }
    Ok(())
}
