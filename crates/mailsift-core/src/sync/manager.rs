//! Supervised connection loop of one account.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

use super::monitor::RealtimeMonitor;
use super::state::{ConnectionState, StateTracker};
use crate::account::AccountConfig;
use crate::pipeline::{CycleKind, FetchPipeline, PipelineContext};
use crate::service::{Connector, MailboxConnection, MailboxError, SearchCriteria};
use crate::settings::SyncSettings;

/// Reports the outcome of the first historical sync.
pub type InitialReport = oneshot::Sender<Result<(), MailboxError>>;

/// Owns the connection of one account for the lifetime of the process.
///
/// Each connection runs a historical sync of the configured window, then
/// monitors for new mail. Whatever ends a connection, the manager waits
/// the reconnect delay and starts over with the same configuration.
pub struct ConnectionManager {
    account: Arc<AccountConfig>,
    connector: Arc<dyn Connector>,
    settings: SyncSettings,
    pipeline: FetchPipeline,
    state: StateTracker,
}

impl ConnectionManager {
    /// Creates a manager in the [`ConnectionState::Disconnected`] state.
    #[must_use]
    pub fn new(
        account: Arc<AccountConfig>,
        connector: Arc<dyn Connector>,
        ctx: Arc<PipelineContext>,
        settings: SyncSettings,
    ) -> Self {
        let pipeline = FetchPipeline::new(Arc::clone(&account), ctx);
        let state = StateTracker::new(account.id.clone());
        Self {
            account,
            connector,
            settings,
            pipeline,
            state,
        }
    }

    /// Observes state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Runs the connect, sync, monitor and reconnect loop forever.
    ///
    /// `initial` receives `Ok` once the first historical sync has been
    /// fully processed, or the error that ended the first connection
    /// attempt before that point. The loop keeps retrying either way.
    pub async fn run(mut self, initial: InitialReport) {
        let mut initial = Some(initial);

        loop {
            let err = self.session(&mut initial).await;
            warn!(account = %self.account.id, error = %err, "Connection ended");

            if let Some(report) = initial.take() {
                let _ = report.send(Err(err));
            }

            self.state.set(ConnectionState::Reconnecting);
            tokio::time::sleep(self.settings.reconnect_delay()).await;
            self.state.set(ConnectionState::Disconnected);
        }
    }

    /// One connection, from connect to failure.
    async fn session(&mut self, initial: &mut Option<InitialReport>) -> MailboxError {
        self.state.set(ConnectionState::Connecting);
        let mut conn = match self.connector.connect(&self.account).await {
            Ok(conn) => conn,
            Err(err) => return err,
        };
        self.state.set(ConnectionState::Ready);

        let err = match self.serve(conn.as_mut(), initial).await {
            Ok(never) => match never {},
            Err(err) => err,
        };

        if !err.is_fatal() {
            let _ = conn.logout().await;
        }
        err
    }

    async fn serve(
        &mut self,
        conn: &mut dyn MailboxConnection,
        initial: &mut Option<InitialReport>,
    ) -> Result<Infallible, MailboxError> {
        let account = &self.account.id;
        conn.open_mailbox(&self.account.mailbox).await?;

        let since = Utc::now()
            .checked_sub_signed(self.settings.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .date_naive();
        let uids = conn.search(&SearchCriteria::Since(since)).await?;
        self.state.set(ConnectionState::HistoricalSync);
        info!(account = %account, %since, count = uids.len(), "Starting historical sync");

        let report = self.pipeline.run(conn, &uids, CycleKind::Historical).await?;
        info!(
            account = %account,
            published = report.published,
            dropped = report.dropped,
            failed = report.publish_failed,
            "Historical sync complete"
        );

        if let Some(report) = initial.take() {
            let _ = report.send(Ok(()));
        }

        RealtimeMonitor::new(account, &self.settings)
            .run(conn, &mut self.pipeline, &self.state)
            .await
    }
}
