//! Reading progress types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Stable identifier of a book, derived from its source path.
///
/// The same derivation names cache entries, so a book keeps its progress
/// and its cache slot for as long as it stays at the same path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(String);

impl BookId {
    /// Derive the id from a source path (canonicalized when possible)
    pub fn from_path(path: &Path) -> Self {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string_lossy().as_bytes());
        BookId(hex::encode(hasher.finalize()))
    }

    /// Wrap an externally supplied identifier
    pub fn new(id: impl Into<String>) -> Self {
        BookId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the reader is in a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadingProgress {
    /// Book this progress belongs to
    pub book_id: BookId,

    /// Spine ordinal of the current chapter
    pub chapter_index: u32,

    /// Scroll offset within the chapter
    pub scroll_position: u64,

    /// Last save; `None` for progress that was never stored
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReadingProgress {
    /// Zero-position progress for a book that has never been opened
    pub fn start(book_id: BookId) -> Self {
        Self {
            book_id,
            chapter_index: 0,
            scroll_position: 0,
            updated_at: None,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.updated_at.is_some()
    }
}
