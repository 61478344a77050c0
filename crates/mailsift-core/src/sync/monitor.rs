//! Live update detection: IDLE when offered, polling otherwise.

use std::convert::Infallible;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::state::{ConnectionState, MonitorMode, StateTracker};
use crate::account::AccountId;
use crate::pipeline::{CycleKind, FetchPipeline};
use crate::service::{IdleEvent, MailboxConnection, MailboxError, SearchCriteria};
use crate::settings::SyncSettings;

/// Watches a connection for new mail and runs monitoring cycles.
///
/// The mode is chosen once, from the connection's capabilities, and
/// kept for the lifetime of the connection.
pub struct RealtimeMonitor<'a> {
    account: &'a AccountId,
    settings: &'a SyncSettings,
}

impl<'a> RealtimeMonitor<'a> {
    /// Creates a monitor for `account`.
    #[must_use]
    pub const fn new(account: &'a AccountId, settings: &'a SyncSettings) -> Self {
        Self { account, settings }
    }

    /// Picks the monitoring mode for `conn`.
    #[must_use]
    pub fn mode(conn: &dyn MailboxConnection) -> MonitorMode {
        if conn.supports_idle() {
            MonitorMode::Idle
        } else {
            MonitorMode::Polling
        }
    }

    /// Monitors until the connection fails.
    ///
    /// Cycle errors that leave the connection usable are logged and the
    /// monitor carries on; the next signal or tick retries naturally.
    ///
    /// # Errors
    ///
    /// Returns the connection-fatal error that ended monitoring.
    pub async fn run(
        &self,
        conn: &mut dyn MailboxConnection,
        pipeline: &mut FetchPipeline,
        state: &StateTracker,
    ) -> Result<Infallible, MailboxError> {
        let mode = Self::mode(conn);
        state.set(ConnectionState::Monitoring(mode));

        match mode {
            MonitorMode::Idle => self.idle_loop(conn, pipeline).await,
            MonitorMode::Polling => self.poll_loop(conn, pipeline).await,
        }
    }

    async fn idle_loop(
        &self,
        conn: &mut dyn MailboxConnection,
        pipeline: &mut FetchPipeline,
    ) -> Result<Infallible, MailboxError> {
        loop {
            match conn.idle(self.settings.idle_timeout()).await? {
                IdleEvent::NewMail(count) => {
                    info!(account = %self.account, count, "New mail signalled");
                    self.cycle(conn, pipeline).await?;
                }
                IdleEvent::Timeout => {
                    debug!(account = %self.account, "IDLE timeout, re-issuing");
                }
            }
        }
    }

    async fn poll_loop(
        &self,
        conn: &mut dyn MailboxConnection,
        pipeline: &mut FetchPipeline,
    ) -> Result<Infallible, MailboxError> {
        // First tick completes at once: mail that arrived during the
        // historical sync is picked up without waiting a full period.
        let mut ticker = tokio::time::interval(self.settings.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!(account = %self.account, "Polling for unseen mail");
            self.cycle(conn, pipeline).await?;
        }
    }

    /// Searches unseen mail and processes it.
    async fn cycle(
        &self,
        conn: &mut dyn MailboxConnection,
        pipeline: &mut FetchPipeline,
    ) -> Result<(), MailboxError> {
        let result = match conn.search(&SearchCriteria::Unseen).await {
            Ok(uids) => pipeline.run(conn, &uids, CycleKind::Monitoring).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(report) => {
                if report.built + report.dropped > 0 {
                    info!(
                        account = %self.account,
                        published = report.published,
                        dropped = report.dropped,
                        "Monitoring cycle complete"
                    );
                }
                Ok(())
            }
            Err(err) if !err.is_fatal() => {
                warn!(account = %self.account, error = %err, "Monitoring cycle aborted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
