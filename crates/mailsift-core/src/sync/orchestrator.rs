//! Startup of every account's connection manager.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use super::manager::ConnectionManager;
use super::state::ConnectionState;
use crate::account::{AccountConfig, AccountId, validate_accounts};
use crate::error::{Error, Result};
use crate::pipeline::PipelineContext;
use crate::service::{Connector, MailboxError};
use crate::settings::SyncSettings;

/// Starts one independent [`ConnectionManager`] per account.
pub struct SyncOrchestrator {
    connector: Arc<dyn Connector>,
    ctx: Arc<PipelineContext>,
    settings: SyncSettings,
}

impl SyncOrchestrator {
    /// Creates an orchestrator sharing `ctx` between all accounts.
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        ctx: Arc<PipelineContext>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            connector,
            ctx,
            settings,
        }
    }

    /// Validates `accounts`, prepares the index and spawns the managers.
    ///
    /// Managers run on detached tasks; one account failing never affects
    /// another.
    ///
    /// # Errors
    ///
    /// Returns an error if no account is configured, if any account or
    /// setting is invalid, or if the index schema cannot be created.
    pub async fn start(&self, accounts: Vec<AccountConfig>) -> Result<SyncHandle> {
        if accounts.is_empty() {
            return Err(Error::NoAccounts);
        }
        validate_accounts(&accounts).map_err(Error::InvalidAccounts)?;
        self.settings.validate()?;
        self.ctx.index.ensure_schema().await?;

        let mut handle = SyncHandle::default();
        for account in accounts {
            let account = Arc::new(account);
            let manager = ConnectionManager::new(
                Arc::clone(&account),
                Arc::clone(&self.connector),
                Arc::clone(&self.ctx),
                self.settings.clone(),
            );
            let state = manager.subscribe();
            let (tx, rx) = oneshot::channel();

            info!(account = %account.id, host = %account.host, "Starting account sync");
            handle.accounts.push(AccountTask {
                id: account.id.clone(),
                state,
                task: tokio::spawn(manager.run(tx)),
            });
            handle.initial.push((account.id.clone(), rx));
        }

        Ok(handle)
    }
}

struct AccountTask {
    id: AccountId,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

/// Handle to the running account tasks.
#[derive(Default)]
pub struct SyncHandle {
    accounts: Vec<AccountTask>,
    initial: Vec<(AccountId, oneshot::Receiver<std::result::Result<(), MailboxError>>)>,
}

impl SyncHandle {
    /// Waits until every account has completed its first historical sync.
    ///
    /// Only the first call waits; later calls return `Ok` immediately.
    ///
    /// # Errors
    ///
    /// Returns the first account whose initial connection failed. The
    /// other accounts keep running, and so does the failed one, which
    /// retries in the background.
    pub async fn initial_sync(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.initial);
        try_join_all(pending.into_iter().map(|(account, rx)| async move {
            match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(Error::InitialSync { account, source }),
                Err(_) => Err(Error::TaskStopped(account)),
            }
        }))
        .await?;
        Ok(())
    }

    /// Current state of every account.
    #[must_use]
    pub fn states(&self) -> Vec<(AccountId, ConnectionState)> {
        self.accounts
            .iter()
            .map(|a| (a.id.clone(), *a.state.borrow()))
            .collect()
    }

    /// Stops every account task.
    pub fn shutdown(self) {
        for account in self.accounts {
            info!(account = %account.id, "Stopping account sync");
            account.task.abort();
        }
    }
}
