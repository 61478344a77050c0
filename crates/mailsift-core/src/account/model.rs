//! Account model types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a configured mailbox account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an account identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Transport security for the mailbox connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    /// No encryption. Rejected at startup.
    None,
    /// TLS from the first byte, usually on port 993.
    #[default]
    Tls,
    /// Plain connection upgraded with `STARTTLS`.
    StartTls,
}

impl Security {
    /// Human-readable label for logs and errors.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }

    /// Conventional IMAP port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Tls => 993,
        }
    }
}

const fn default_port() -> u16 {
    Security::Tls.default_port()
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

/// Connection settings for one mailbox account.
///
/// Supplied at startup and never mutated afterwards; the sync layer
/// shares it behind an `Arc`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account identifier, also the prefix of every document id.
    pub id: AccountId,
    /// Server hostname.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login name sent with `LOGIN`.
    pub username: String,
    /// Password for authentication. Resolved from the keyring when absent.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Security mode.
    #[serde(default)]
    pub security: Security,
    /// Mailbox to synchronize.
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
}

impl AccountConfig {
    /// Creates a TLS account on port 993 watching `INBOX`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(id),
            host: host.into(),
            port: default_port(),
            username: username.into(),
            password: Some(password.into()),
            security: Security::Tls,
            mailbox: default_mailbox(),
        }
    }

    /// Returns the password, or an empty string when none is set.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("security", &self.security)
            .field("mailbox", &self.mailbox)
            .finish()
    }
}
