//! Reading progress persistence

pub mod migrate;
mod sqlite;

pub use migrate::MigrationOutcome;
pub use sqlite::{open_pool, SqliteProgressStore};

use crate::error::StoreError;
use crate::types::{BookId, ReadingProgress};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// Per-book reading position storage
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Stored progress, or `None` for a book never saved
    async fn try_load(&self, book_id: &BookId) -> Result<Option<ReadingProgress>, StoreError>;

    /// Stored progress, falling back to the start of the book when nothing
    /// is stored or the store cannot be read
    async fn load(&self, book_id: &BookId) -> ReadingProgress {
        match self.try_load(book_id).await {
            Ok(Some(progress)) => progress,
            Ok(None) => ReadingProgress::start(book_id.clone()),
            Err(e) => {
                warn!(book_id = %book_id, error = %e, "Progress unavailable, starting at the beginning");
                ReadingProgress::start(book_id.clone())
            }
        }
    }

    /// Upsert the position and stamp the save time
    async fn save(
        &self,
        book_id: &BookId,
        chapter_index: u32,
        scroll_position: u64,
    ) -> Result<ReadingProgress, StoreError>;

    /// Forget a book; returns whether anything was stored
    async fn remove(&self, book_id: &BookId) -> Result<bool, StoreError>;

    /// Every stored row, most recently saved first
    async fn list(&self) -> Result<Vec<ReadingProgress>, StoreError>;
}

/// In-memory progress store (for testing)
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    rows: RwLock<HashMap<BookId, ReadingProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn try_load(&self, book_id: &BookId) -> Result<Option<ReadingProgress>, StoreError> {
        Ok(self.rows.read().await.get(book_id).cloned())
    }

    async fn save(
        &self,
        book_id: &BookId,
        chapter_index: u32,
        scroll_position: u64,
    ) -> Result<ReadingProgress, StoreError> {
        let progress = ReadingProgress {
            book_id: book_id.clone(),
            chapter_index,
            scroll_position,
            updated_at: Some(Utc::now()),
        };
        self.rows
            .write()
            .await
            .insert(book_id.clone(), progress.clone());
        Ok(progress)
    }

    async fn remove(&self, book_id: &BookId) -> Result<bool, StoreError> {
        Ok(self.rows.write().await.remove(book_id).is_some())
    }

    async fn list(&self) -> Result<Vec<ReadingProgress>, StoreError> {
        let mut rows: Vec<_> = self.rows.read().await.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.book_id.cmp(&b.book_id))
        });
        Ok(rows)
    }
}
