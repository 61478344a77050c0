//! Configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mailsift_core::{AccountConfig, OllamaConfig, SyncSettings};

/// Outbound notification targets. Unset targets are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Slack incoming-webhook URL.
    pub slack_webhook_url: Option<String>,
    /// Generic JSON webhook URL.
    pub webhook_url: Option<String>,
}

/// The `config.json` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Accounts to synchronize.
    pub accounts: Vec<AccountConfig>,
    /// Location of the `SQLite` index. Defaults to the data directory.
    pub index_path: Option<PathBuf>,
    /// Classifier endpoint.
    pub classifier: OllamaConfig,
    /// Notification targets.
    pub notifications: NotificationConfig,
    /// Pipeline tuning.
    pub sync: SyncSettings,
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default location.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Index path, creating its parent directory when needed.
    pub async fn index_path(&self) -> Result<PathBuf> {
        let path = self.index_path.clone().unwrap_or_else(default_index_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(path)
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
        .join("config.json")
}

fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
        .join("emails.db")
}
