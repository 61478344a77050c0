//! Searchable record store.
//!
//! Publication is an idempotent upsert keyed by [`DocumentId`]: storing
//! the same `(account, uid)` twice leaves one document holding the
//! latest values.

mod filter;
mod sqlite;

use async_trait::async_trait;

pub use filter::{DEFAULT_LIMIT, SearchFilter, SearchPage};
pub use sqlite::SqliteIndex;

use crate::record::{DocumentId, EmailRecord};

/// Errors raised by an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a record.
    #[error("Corrupt document {id}: {reason}")]
    Corrupt {
        /// Document id of the row.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Store the pipeline publishes records to.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Creates the schema if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), IndexError>;

    /// Inserts or replaces the document `id`.
    async fn upsert(&self, id: &DocumentId, record: &EmailRecord) -> Result<(), IndexError>;

    /// Returns one page of records matching `filter`, newest first.
    async fn search(&self, filter: &SearchFilter) -> Result<SearchPage, IndexError>;

    /// Looks up a single document.
    async fn get(&self, id: &DocumentId) -> Result<Option<EmailRecord>, IndexError>;
}
