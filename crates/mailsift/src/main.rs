//! # mailsift
//!
//! Keeps configured IMAP mailboxes synchronized, classifies every message
//! and publishes it to a local search index.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod config;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsift_core::index::SearchIndex;
use mailsift_core::{
    AccountId, ImapConnector, MimeParser, Notifier, OllamaClassifier, PipelineContext,
    SlackNotifier, SqliteIndex, SyncOrchestrator, WebhookNotifier, credentials,
};

use cli::{Cli, Command, SearchArgs};
use config::{AppConfig, NotificationConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info,mailsift_core=info".into()),
        )
        // stdout carries `search` results
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Command::Run { exit_after_sync } => run(config_path, exit_after_sync).await,
        Command::Search(args) => search(config_path, args).await.map(|()| ExitCode::SUCCESS),
        Command::SetPassword { account } => set_password(&account).map(|()| ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|err| {
        error!("{err:#}");
        ExitCode::FAILURE
    })
}

/// Synchronizes every account until Ctrl-C, or until the initial sync
/// finishes when `exit_after_sync` is set.
async fn run(config_path: Option<&Path>, exit_after_sync: bool) -> Result<ExitCode> {
    let mut config = AppConfig::load(config_path).await?;
    credentials::resolve_passwords(&mut config.accounts)
        .context("Failed to read passwords from the keyring")?;

    let index_path = config.index_path().await?;
    let index = SqliteIndex::new(&index_path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to open index {}", index_path.display()))?;

    let ctx = PipelineContext::new(
        Arc::new(MimeParser),
        Arc::new(OllamaClassifier::new(config.classifier.clone())),
        Arc::new(index),
        notifiers(&config.notifications),
        &config.sync,
    );
    let orchestrator = SyncOrchestrator::new(
        Arc::new(ImapConnector::new()),
        Arc::new(ctx),
        config.sync.clone(),
    );

    let accounts = config.accounts.len();
    let mut handle = orchestrator.start(config.accounts).await?;
    info!(accounts, index = %index_path.display(), "Synchronization started");

    let initial = tokio::select! {
        result = handle.initial_sync() => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            None
        }
    };

    let code = match initial {
        Some(Ok(())) => {
            info!("Initial sync complete");
            ExitCode::SUCCESS
        }
        Some(Err(err)) => {
            error!(error = %err, "Initial sync failed");
            ExitCode::FAILURE
        }
        None => {
            info!("Interrupted during initial sync");
            handle.shutdown();
            return Ok(ExitCode::FAILURE);
        }
    };

    if exit_after_sync {
        handle.shutdown();
        return Ok(code);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");
    handle.shutdown();
    Ok(ExitCode::SUCCESS)
}

fn notifiers(config: &NotificationConfig) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    match config.slack_webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => notifiers.push(Arc::new(SlackNotifier::new(url))),
        _ => warn!("Slack webhook URL not configured, Slack notifications disabled"),
    }
    match config.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => notifiers.push(Arc::new(WebhookNotifier::new(url))),
        _ => warn!("Webhook URL not configured, webhook notifications disabled"),
    }

    notifiers
}

/// Prints one page of search results as JSON.
async fn search(config_path: Option<&Path>, args: SearchArgs) -> Result<()> {
    let config = AppConfig::load(config_path).await?;
    let index_path = config.index_path().await?;
    let index = SqliteIndex::new(&index_path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to open index {}", index_path.display()))?;

    let page = index.search(&args.into()).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

/// Reads a password from stdin and stores it for `account`.
fn set_password(account: &str) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read password from stdin")?;
    let password = input.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    credentials::store_imap_password(&AccountId::new(account), password)
        .context("Failed to store password in the keyring")?;
    info!(account, "Password stored in the keyring");
    Ok(())
}
