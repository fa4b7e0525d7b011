//! SQLite-backed progress store

use super::migrate::{self, TABLE};
use super::ProgressStore;
use crate::error::StoreError;
use crate::types::{BookId, ReadingProgress};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Progress rows in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

/// Open a connection pool on a database file.
///
/// With `create` false a missing database file is an error.
pub async fn open_pool(path: &Path, create: bool) -> Result<SqlitePool, StoreError> {
    if create {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    Ok(pool)
}

impl SqliteProgressStore {
    /// Open (creating if needed) the database and bring its schema up to date
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = open_pool(path, true).await?;
        Self::from_pool(pool).await
    }

    /// Use an existing pool; runs the schema migration
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let outcome = migrate::migrate(&pool).await?;
        debug!(%outcome, "Progress schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_progress(row: &SqliteRow) -> Result<ReadingProgress, StoreError> {
    let book_id: String = row.try_get("book_id")?;
    let chapter_index: i64 = row.try_get("chapter_index")?;
    let scroll_position: i64 = row.try_get("scroll_position")?;
    let updated_at: String = row.try_get("updated_at")?;

    let chapter_index = u32::try_from(chapter_index).unwrap_or_else(|_| {
        warn!(book_id, chapter_index, "Chapter index out of range, using 0");
        0
    });
    let scroll_position = u64::try_from(scroll_position).unwrap_or_else(|_| {
        warn!(book_id, scroll_position, "Negative scroll position, using 0");
        0
    });
    let updated_at = parse_timestamp(&updated_at);
    if updated_at.is_none() {
        warn!(book_id, "Unparseable updated_at timestamp");
    }

    Ok(ReadingProgress {
        book_id: BookId::new(book_id),
        chapter_index,
        scroll_position,
        updated_at,
    })
}

/// Parse an RFC 3339 timestamp, or SQLite's `CURRENT_TIMESTAMP` form taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, SQLITE_TIMESTAMP)
        .ok()
        .map(|t| t.and_utc())
}

const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.f";

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn try_load(&self, book_id: &BookId) -> Result<Option<ReadingProgress>, StoreError> {
        let sql = format!(
            "SELECT book_id, chapter_index, scroll_position, updated_at FROM {} WHERE book_id = ?1",
            TABLE
        );
        let row = sqlx::query(&sql)
            .bind(book_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_progress).transpose()
    }

    async fn save(
        &self,
        book_id: &BookId,
        chapter_index: u32,
        scroll_position: u64,
    ) -> Result<ReadingProgress, StoreError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} (book_id, chapter_index, scroll_position, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(book_id) DO UPDATE SET \
             chapter_index = excluded.chapter_index, \
             scroll_position = excluded.scroll_position, \
             updated_at = excluded.updated_at",
            TABLE
        );
        sqlx::query(&sql)
            .bind(book_id.as_str())
            .bind(i64::from(chapter_index))
            .bind(i64::try_from(scroll_position).unwrap_or(i64::MAX))
            .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&self.pool)
            .await?;

        debug!(book_id = %book_id, chapter_index, scroll_position, "Saved progress");
        Ok(ReadingProgress {
            book_id: book_id.clone(),
            chapter_index,
            scroll_position,
            updated_at: Some(now),
        })
    }

    async fn remove(&self, book_id: &BookId) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE book_id = ?1", TABLE);
        let result = sqlx::query(&sql)
            .bind(book_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ReadingProgress>, StoreError> {
        let sql = format!(
            "SELECT book_id, chapter_index, scroll_position, updated_at FROM {} \
             ORDER BY updated_at DESC, book_id",
            TABLE
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_progress).collect()
    }
}
