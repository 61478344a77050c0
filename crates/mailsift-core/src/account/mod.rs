//! Account configuration.
//!
//! Provides the per-account connection settings, their startup
//! validation, and keyring-backed password lookup.

pub mod credentials;
mod model;
mod validation;

pub use credentials::{CredentialError, CredentialResult};
pub use model::{AccountConfig, AccountId, Security};
pub use validation::{ValidationError, ValidationResult, validate_account, validate_accounts};
