//! Tunable constants of the synchronization pipeline.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A setting that would stall or crash an account task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// `poll_interval_secs` is zero.
    #[error("poll interval must be at least one second")]
    ZeroPollInterval,

    /// `idle_timeout_secs` is zero.
    #[error("IDLE timeout must be at least one second")]
    ZeroIdleTimeout,

    /// `window_days` reaches before the earliest representable date.
    #[error("historical window of {0} days is out of range")]
    WindowOutOfRange(u32),
}

/// Timing and sizing knobs shared by every account.
///
/// Every field has a default so a configuration file may omit any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Historical window in days.
    pub window_days: u32,
    /// Interval between unread searches when IDLE is unavailable.
    pub poll_interval_secs: u64,
    /// Delay before reconnecting after a connection failure.
    pub reconnect_delay_secs: u64,
    /// Pause between two queued records of the same account.
    pub throttle_ms: u64,
    /// Classification attempts before falling back to `Uncategorized`.
    pub max_classify_attempts: u32,
    /// Maximum stored body length in characters.
    pub body_limit: usize,
    /// IDLE is re-issued after this long without server data.
    pub idle_timeout_secs: u64,
    /// Global cap on concurrent classifier calls across accounts.
    ///
    /// `None` leaves accounts unrestricted.
    pub classify_concurrency: Option<usize>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            poll_interval_secs: 300,
            reconnect_delay_secs: 5,
            throttle_ms: 100,
            max_classify_attempts: 3,
            body_limit: 5000,
            // Servers drop IDLE after 30 minutes
            idle_timeout_secs: 29 * 60,
            classify_concurrency: None,
        }
    }
}

impl SyncSettings {
    /// Historical window as a `chrono` duration.
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }

    /// Polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reconnect delay.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Inter-record throttle.
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// IDLE timeout.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Checks the values account tasks rely on.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.poll_interval_secs == 0 {
            return Err(SettingsError::ZeroPollInterval);
        }
        if self.idle_timeout_secs == 0 {
            return Err(SettingsError::ZeroIdleTimeout);
        }
        chrono::Duration::try_days(i64::from(self.window_days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or(SettingsError::WindowOutOfRange(self.window_days))?;
        Ok(())
    }
}
