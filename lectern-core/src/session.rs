//! A reader's position in one open book

use crate::cache::BookCache;
use crate::error::Result;
use crate::progress::ProgressStore;
use crate::types::{Book, BookId, ChapterContent, ReadingProgress, Target};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// An open book plus the reader's persisted position in it.
///
/// Every navigation is saved immediately; save failures are returned to the
/// caller and leave the in-memory position unchanged.
pub struct ReadingSession {
    book: Arc<Book>,
    store: Arc<dyn ProgressStore>,
    progress: ReadingProgress,
}

impl ReadingSession {
    /// Load the book through the cache and restore saved progress. The first
    /// open of a book stores its starting position.
    pub async fn open(
        cache: &BookCache,
        store: Arc<dyn ProgressStore>,
        path: &Path,
    ) -> Result<Self> {
        let book = cache.get(path).await?;
        let book_id = BookId::from_path(path);
        let progress = store.load(&book_id).await;
        let mut session = Self::resume(book, store, progress);
        if !session.progress.is_stored() {
            debug!(book_id = %session.book_id(), "First open, recording starting position");
            let (index, scroll) = (session.chapter_index(), session.progress.scroll_position);
            session.save(index, scroll).await?;
        }
        Ok(session)
    }

    /// Apply stored progress to a book, clamping positions the book
    /// cannot honor
    pub fn resume(book: Arc<Book>, store: Arc<dyn ProgressStore>, mut progress: ReadingProgress) -> Self {
        let last = book.len().saturating_sub(1);
        if progress.chapter_index as usize > last {
            warn!(
                book_id = %progress.book_id,
                stored = progress.chapter_index,
                chapters = book.len(),
                "Stored chapter out of range, clamping"
            );
            progress.chapter_index = u32::try_from(last).unwrap_or(u32::MAX);
            progress.scroll_position = 0;
        }
        Self {
            book,
            store,
            progress,
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn book_id(&self) -> &BookId {
        &self.progress.book_id
    }

    pub fn progress(&self) -> &ReadingProgress {
        &self.progress
    }

    pub fn chapter_index(&self) -> usize {
        self.progress.chapter_index as usize
    }

    pub fn current_chapter(&self) -> Option<&ChapterContent> {
        self.book.chapter(self.chapter_index())
    }

    /// Jump to a spine ordinal. Returns false, without saving, when the
    /// ordinal is outside the spine.
    pub async fn go_to(&mut self, index: usize) -> Result<bool> {
        if index >= self.book.len() {
            return Ok(false);
        }
        self.save(index, 0).await?;
        Ok(true)
    }

    pub async fn next(&mut self) -> Result<bool> {
        self.go_to(self.chapter_index() + 1).await
    }

    pub async fn previous(&mut self) -> Result<bool> {
        match self.chapter_index().checked_sub(1) {
            Some(index) => self.go_to(index).await,
            None => Ok(false),
        }
    }

    pub async fn scroll_to(&mut self, offset: u64) -> Result<()> {
        self.save(self.chapter_index(), offset).await
    }

    /// Navigate to a TOC entry or link target. Returns false when the target
    /// names no spine document.
    pub async fn follow(&mut self, target: &Target) -> Result<bool> {
        match self.book.resolve(target) {
            Some(index) => {
                debug!(target = %target, index, "Following link");
                self.save(index, 0).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save(&mut self, index: usize, scroll_position: u64) -> Result<()> {
        let chapter_index = u32::try_from(index).unwrap_or(u32::MAX);
        self.progress = self
            .store
            .save(&self.progress.book_id, chapter_index, scroll_position)
            .await?;
        Ok(())
    }
}
