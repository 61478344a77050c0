//! Connection lifecycle states.

use std::fmt;

use tokio::sync::watch;
use tracing::info;

use crate::account::AccountId;

/// How live updates are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorMode {
    /// Server push (IMAP IDLE).
    Idle,
    /// Periodic unread search.
    Polling,
}

/// Lifecycle state of one account's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connecting and logging in.
    Connecting,
    /// Logged in, about to open the mailbox.
    Ready,
    /// Catching up on the historical window.
    HistoricalSync,
    /// Watching for new mail.
    Monitoring(MonitorMode),
    /// Waiting out the reconnect delay.
    Reconnecting,
}

impl ConnectionState {
    /// Name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::HistoricalSync => "historical_sync",
            Self::Monitoring(MonitorMode::Idle) => "monitoring_idle",
            Self::Monitoring(MonitorMode::Polling) => "monitoring_polling",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishes and logs the state of one account.
#[derive(Debug)]
pub struct StateTracker {
    account: AccountId,
    tx: watch::Sender<ConnectionState>,
}

impl StateTracker {
    /// Creates a tracker starting in [`ConnectionState::Disconnected`].
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { account, tx }
    }

    /// Receiver observing every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Moves to `state` and logs the transition.
    pub fn set(&self, state: ConnectionState) {
        let previous = self.tx.send_replace(state);
        info!(account = %self.account, from = %previous, to = %state, "Connection state changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_publishes_transitions() {
        let tracker = StateTracker::new(AccountId::new("a"));
        let rx = tracker.subscribe();
        assert_eq!(*rx.borrow(), ConnectionState::Disconnected);

        tracker.set(ConnectionState::Connecting);
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);

        let late = tracker.subscribe();
        assert_eq!(*late.borrow(), ConnectionState::Connecting);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(
            ConnectionState::Monitoring(MonitorMode::Idle).to_string(),
            "monitoring_idle"
        );
        assert_eq!(ConnectionState::Reconnecting.as_str(), "reconnecting");
    }
}
