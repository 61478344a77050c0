//! Account connection lifecycle.
//!
//! [`SyncOrchestrator`] spawns one [`ConnectionManager`] per account.
//! Each manager connects, runs the historical sync, then hands the
//! connection to a [`RealtimeMonitor`] until it fails, and reconnects.

mod manager;
mod monitor;
mod orchestrator;
mod state;

pub use manager::{ConnectionManager, InitialReport};
pub use monitor::RealtimeMonitor;
pub use orchestrator::{SyncHandle, SyncOrchestrator};
pub use state::{ConnectionState, MonitorMode, StateTracker};
