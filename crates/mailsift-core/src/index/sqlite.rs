//! `SQLite` implementation of [`SearchIndex`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use tracing::debug;

use super::filter::{SearchFilter, SearchPage};
use super::{IndexError, SearchIndex};
use crate::account::AccountId;
use crate::record::{Category, DocumentId, EmailRecord, Uid};

const SELECT_COLUMNS: &str =
    "SELECT id, account, uid, folder, subject, sender, date, body, category FROM emails";

/// Record store in a local `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Opens (or creates) the database file at `database_path`.
    ///
    /// Creates the schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self, IndexError> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let index = Self { pool };
        index.ensure_schema().await?;
        Ok(index)
    }

    /// Create an in-memory index for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self, IndexError> {
        // One connection that never expires, or the database goes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let index = Self { pool };
        index.ensure_schema().await?;
        Ok(index)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SearchFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(pattern) = filter.like_pattern() {
        builder
            .push(" AND (subject LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR body LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(account) = &filter.account {
        builder.push(" AND account = ").push_bind(account.clone());
    }
    if let Some(folder) = &filter.folder {
        builder.push(" AND folder = ").push_bind(folder.clone());
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
}

fn row_to_record(row: &SqliteRow) -> Result<EmailRecord, IndexError> {
    let id: String = row.try_get("id")?;
    let corrupt = |reason: String| IndexError::Corrupt {
        id: id.clone(),
        reason,
    };

    let uid: i64 = row.try_get("uid")?;
    let uid = Uid::try_from(uid).map_err(|_| corrupt(format!("uid {uid} out of range")))?;
    let date: String = row.try_get("date")?;
    let date = DateTime::parse_from_rfc3339(&date)
        .map_err(|e| corrupt(format!("date {date}: {e}")))?
        .with_timezone(&Utc);
    let category: String = row.try_get("category")?;
    let category =
        Category::parse(&category).ok_or_else(|| corrupt(format!("category {category}")))?;
    let account: String = row.try_get("account")?;

    Ok(EmailRecord {
        account: AccountId::new(account),
        uid,
        folder: row.try_get("folder")?,
        subject: row.try_get("subject")?,
        sender: row.try_get("sender")?,
        date,
        body: row.try_get("body")?,
        category,
    })
}

#[async_trait]
impl SearchIndex for SqliteIndex {
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id TEXT PRIMARY KEY,
                account TEXT NOT NULL,
                uid INTEGER NOT NULL,
                folder TEXT NOT NULL,
                subject TEXT NOT NULL,
                sender TEXT NOT NULL,
                date TEXT NOT NULL,
                body TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'Uncategorized',
                indexed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Newest-first listing
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_emails_date ON emails(date DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_emails_account_category ON emails(account, category)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert(&self, id: &DocumentId, record: &EmailRecord) -> Result<(), IndexError> {
        sqlx::query(
            r"
            INSERT INTO emails (id, account, uid, folder, subject, sender, date, body, category)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                account = excluded.account,
                uid = excluded.uid,
                folder = excluded.folder,
                subject = excluded.subject,
                sender = excluded.sender,
                date = excluded.date,
                body = excluded.body,
                category = excluded.category,
                indexed_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(id.as_str())
        .bind(record.account.as_str())
        .bind(i64::from(record.uid))
        .bind(&record.folder)
        .bind(&record.subject)
        .bind(&record.sender)
        .bind(record.date.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(&record.body)
        .bind(record.category.as_str())
        .execute(&self.pool)
        .await?;

        debug!(id = %id, category = %record.category, "Indexed document");
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter) -> Result<SearchPage, IndexError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM emails");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY date DESC, id ASC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));
        let rows = select.build().fetch_all(&self.pool).await?;

        let emails = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchPage {
            total: u64::try_from(total).unwrap_or_default(),
            page: filter.page.max(1),
            limit: filter.limit,
            emails,
        })
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<EmailRecord>, IndexError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_test::assert_ok;

    fn record(account: &str, uid: Uid, day: u32, subject: &str, category: Category) -> EmailRecord {
        EmailRecord {
            account: AccountId::new(account),
            uid,
            folder: "INBOX".to_string(),
            subject: subject.to_string(),
            sender: "sender@example.com".to_string(),
            date: Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap(),
            body: format!("body of {subject}"),
            category,
        }
    }

    async fn seeded() -> SqliteIndex {
        let index = SqliteIndex::in_memory().await.unwrap();
        for r in [
            record("work", 1, 1, "Quarterly pricing", Category::Interested),
            record("work", 2, 3, "Lunch?", Category::Spam),
            record("home", 1, 2, "Pricing update", Category::Spam),
            record("home", 2, 4, "Out until Monday", Category::OutOfOffice),
        ] {
            index.upsert(&r.document_id(), &r).await.unwrap();
        }
        index
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let index = SqliteIndex::in_memory().await.unwrap();
        let mut r = record("work", 9, 1, "Hello", Category::Uncategorized);
        assert_ok!(index.upsert(&r.document_id(), &r).await);
        r.category = Category::Interested;
        assert_ok!(index.upsert(&r.document_id(), &r).await);

        let page = index.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.emails[0].category, Category::Interested);

        let stored = index.get(&r.document_id()).await.unwrap().unwrap();
        assert_eq!(stored, r);
    }

    #[tokio::test]
    async fn test_same_uid_different_accounts_are_distinct() {
        let index = seeded().await;
        let work = index
            .get(&DocumentId::new(&AccountId::new("work"), 1))
            .await
            .unwrap()
            .unwrap();
        let home = index
            .get(&DocumentId::new(&AccountId::new("home"), 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(work.subject, "Quarterly pricing");
        assert_eq!(home.subject, "Pricing update");
    }

    #[tokio::test]
    async fn test_search_orders_newest_first() {
        let index = seeded().await;
        let page = index.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(page.total, 4);
        let days: Vec<u32> = page
            .emails
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(days, vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let index = seeded().await;

        let filter = SearchFilter {
            query: Some("pricing".to_string()),
            ..SearchFilter::default()
        };
        assert_eq!(index.search(&filter).await.unwrap().total, 2);

        let filter = SearchFilter {
            query: Some("pricing".to_string()),
            account: Some("home".to_string()),
            ..SearchFilter::default()
        };
        let page = index.search(&filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.emails[0].subject, "Pricing update");

        let filter = SearchFilter {
            category: Some(Category::Spam),
            folder: Some("INBOX".to_string()),
            ..SearchFilter::default()
        };
        assert_eq!(index.search(&filter).await.unwrap().total, 2);

        let filter = SearchFilter {
            folder: Some("Archive".to_string()),
            ..SearchFilter::default()
        };
        assert_eq!(index.search(&filter).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let index = seeded().await;
        let filter = SearchFilter {
            page: 2,
            limit: 3,
            ..SearchFilter::default()
        };
        let page = index.search(&filter).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.page, 2);
        assert_eq!(page.emails.len(), 1);
        assert_eq!(page.emails[0].subject, "Quarterly pricing");
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let index = seeded().await;
        let filter = SearchFilter {
            query: Some("%".to_string()),
            ..SearchFilter::default()
        };
        assert_eq!(index.search(&filter).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let index = SqliteIndex::in_memory().await.unwrap();
        let missing = index
            .get(&DocumentId::new(&AccountId::new("x"), 1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_ensure_schema_is_repeatable() {
        let index = SqliteIndex::in_memory().await.unwrap();
        assert_ok!(index.ensure_schema().await);
    }
}
