//! services/courier/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dailylit_core::domain::{
    Book, DeliveryCommit, Document, DocumentStatus, HistoryEntry, NewDocument, ProgressCursor,
};
use dailylit_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Stores each setting unless a value for its key already exists.
    pub async fn seed_settings(&self, defaults: &[(&str, String)]) -> Result<(), sqlx::Error> {
        for (key, value) in defaults {
            let result = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(*key)
                .bind(value)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() > 0 {
                debug!(key = *key, "Seeded setting.");
            }
        }
        Ok(())
    }

    async fn begin(&self) -> PortResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(unexpected)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn document_not_found(document_id: Uuid) -> PortError {
    PortError::NotFound(format!("Document {} not found", document_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const SELECT_BOOKS: &str = "SELECT d.id, d.title, d.author, d.source_locator, d.source_kind, \
     d.total_words, d.total_pages, d.created_at, d.status, \
     p.current_page, p.current_word_position, p.pages_per_day, p.last_sent_date, p.completed_date \
     FROM documents d JOIN progress p ON p.document_id = d.id";

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: Option<String>,
    source_locator: String,
    source_kind: String,
    total_words: i64,
    total_pages: i64,
    created_at: DateTime<Utc>,
    status: String,
    current_page: i64,
    current_word_position: i64,
    pages_per_day: i64,
    last_sent_date: Option<NaiveDate>,
    completed_date: Option<NaiveDate>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        Ok(Book {
            document: Document {
                id: self.id,
                title: self.title,
                author: self.author,
                source_locator: self.source_locator,
                source_kind: self.source_kind.parse().map_err(PortError::Unexpected)?,
                total_words: self.total_words as usize,
                total_pages: self.total_pages as usize,
                created_at: self.created_at,
                status: self.status.parse().map_err(PortError::Unexpected)?,
            },
            progress: ProgressCursor {
                current_page: self.current_page as usize,
                current_word_position: self.current_word_position as usize,
                pages_per_day: self.pages_per_day as usize,
                last_sent_date: self.last_sent_date,
                completed_date: self.completed_date,
            },
        })
    }
}

#[derive(FromRow)]
struct HistoryRecord {
    id: Uuid,
    document_id: Uuid,
    sent_date: NaiveDate,
    start_page: i64,
    end_page: i64,
    word_start: i64,
    word_end: i64,
    created_at: DateTime<Utc>,
}
impl HistoryRecord {
    fn to_domain(self) -> HistoryEntry {
        HistoryEntry {
            id: self.id,
            document_id: self.document_id,
            sent_date: self.sent_date,
            start_page: self.start_page as usize,
            end_page: self.end_page as usize,
            word_start: self.word_start as usize,
            word_end: self.word_end as usize,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SettingRecord {
    key: String,
    value: String,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_document(&self, document: NewDocument) -> PortResult<Book> {
        let book = Book {
            document: Document {
                id: Uuid::new_v4(),
                title: document.title,
                author: document.author,
                source_locator: document.source_locator,
                source_kind: document.source_kind,
                total_words: document.total_words,
                total_pages: document.total_pages.max(1),
                created_at: Utc::now(),
                status: DocumentStatus::Active,
            },
            progress: ProgressCursor::new(document.pages_per_day),
        };

        let mut tx = self.begin().await?;
        sqlx::query(
            "INSERT INTO documents \
             (id, title, author, source_locator, source_kind, total_words, total_pages, created_at, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(book.document.id)
        .bind(&book.document.title)
        .bind(&book.document.author)
        .bind(&book.document.source_locator)
        .bind(book.document.source_kind.as_str())
        .bind(book.document.total_words as i64)
        .bind(book.document.total_pages as i64)
        .bind(book.document.created_at)
        .bind(book.document.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("INSERT INTO progress (document_id, pages_per_day) VALUES (?, ?)")
            .bind(book.document.id)
            .bind(book.progress.pages_per_day as i64)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        Ok(book)
    }

    async fn get_book(&self, document_id: Uuid) -> PortResult<Book> {
        let sql = format!("{} WHERE d.id = ?", SELECT_BOOKS);
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(document_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => document_not_found(document_id),
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let sql = format!("{} ORDER BY d.rowid ASC", SELECT_BOOKS);
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_active_books(&self) -> PortResult<Vec<Book>> {
        let sql = format!("{} WHERE d.status = 'active' ORDER BY d.rowid ASC", SELECT_BOOKS);
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<Document> {
        let book = self.get_book(document_id).await?;

        let mut tx = self.begin().await?;
        for sql in [
            "DELETE FROM history WHERE document_id = ?",
            "DELETE FROM progress WHERE document_id = ?",
            "DELETE FROM documents WHERE id = ?",
        ] {
            sqlx::query(sql)
                .bind(document_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;

        Ok(book.document)
    }

    async fn set_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        today: NaiveDate,
    ) -> PortResult<()> {
        let mut tx = self.begin().await?;
        let updated = sqlx::query("UPDATE documents SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(document_not_found(document_id));
        }

        let completed_date = (status == DocumentStatus::Completed).then_some(today);
        sqlx::query(
            "UPDATE progress SET completed_date = CASE WHEN ? IS NULL THEN NULL \
             ELSE COALESCE(completed_date, ?) END WHERE document_id = ?",
        )
        .bind(completed_date)
        .bind(completed_date)
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)
    }

    async fn set_pages_per_day(&self, document_id: Uuid, pages_per_day: usize) -> PortResult<()> {
        let updated = sqlx::query("UPDATE progress SET pages_per_day = ? WHERE document_id = ?")
            .bind(pages_per_day.max(1) as i64)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(document_not_found(document_id));
        }
        Ok(())
    }

    async fn reset_progress(&self, document_id: Uuid) -> PortResult<()> {
        let mut tx = self.begin().await?;
        let updated = sqlx::query(
            "UPDATE progress SET current_page = 0, current_word_position = 0, \
             last_sent_date = NULL, completed_date = NULL WHERE document_id = ?",
        )
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(document_not_found(document_id));
        }

        for sql in [
            "UPDATE documents SET status = 'active' WHERE id = ?",
            "DELETE FROM history WHERE document_id = ?",
        ] {
            sqlx::query(sql)
                .bind(document_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)
    }

    async fn record_delivery(&self, commit: DeliveryCommit) -> PortResult<()> {
        let mut tx = self.begin().await?;

        // Conditional on the cursor the caller read; a moved cursor matches no row.
        let updated = sqlx::query(
            "UPDATE progress SET current_page = ?, current_word_position = ?, last_sent_date = ?, \
             completed_date = COALESCE(?, completed_date) \
             WHERE document_id = ? AND current_page = ?",
        )
        .bind(commit.new_page as i64)
        .bind(commit.word_position as i64)
        .bind(commit.sent_date)
        .bind(commit.completed.then_some(commit.sent_date))
        .bind(commit.document_id)
        .bind(commit.expected_page as i64)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM progress WHERE document_id = ?")
                .bind(commit.document_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?
                .is_some();
            return Err(if exists {
                PortError::Conflict(format!(
                    "Document {} moved past page {}",
                    commit.document_id, commit.expected_page
                ))
            } else {
                document_not_found(commit.document_id)
            });
        }

        if commit.completed {
            sqlx::query("UPDATE documents SET status = 'completed' WHERE id = ?")
                .bind(commit.document_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }

        let entry = &commit.history;
        sqlx::query(
            "INSERT INTO history \
             (id, document_id, sent_date, start_page, end_page, word_start, word_end, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id)
        .bind(entry.document_id)
        .bind(entry.sent_date)
        .bind(entry.start_page as i64)
        .bind(entry.end_page as i64)
        .bind(entry.word_start as i64)
        .bind(entry.word_end as i64)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)
    }

    async fn mark_completed(&self, document_id: Uuid, today: NaiveDate) -> PortResult<()> {
        let mut tx = self.begin().await?;
        let updated = sqlx::query("UPDATE documents SET status = 'completed' WHERE id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(document_not_found(document_id));
        }
        sqlx::query("UPDATE progress SET completed_date = ? WHERE document_id = ?")
            .bind(today)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)
    }

    async fn get_history(&self, document_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        let records = sqlx::query_as::<_, HistoryRecord>(
            "SELECT id, document_id, sent_date, start_page, end_page, word_start, word_end, \
             created_at FROM history WHERE document_id = ? ORDER BY rowid ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_setting(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn set_setting(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_settings(&self) -> PortResult<BTreeMap<String, String>> {
        let records = sqlx::query_as::<_, SettingRecord>("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| (r.key, r.value)).collect())
    }
}
