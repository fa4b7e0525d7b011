//! Book metadata types (Dublin Core subset)

use serde::{Deserialize, Serialize};

/// Descriptive metadata parsed from the package document.
///
/// Every field is optional because real-world packages omit almost anything.
/// The publication date is kept as the raw string found in `dc:date`; it is
/// not normalized because publishers mix years, dates and full timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookMetadata {
    /// Book title
    pub title: Option<String>,

    /// Authors/creators, in declared order
    pub authors: Vec<String>,

    /// Language code (usually BCP 47)
    pub language: Option<String>,

    /// First declared identifier (ISBN, UUID URN, ...)
    pub identifier: Option<String>,

    /// Publication date as declared
    pub date: Option<String>,

    /// Book description/summary
    pub description: Option<String>,

    /// Publisher name
    pub publisher: Option<String>,

    /// Subject/genre tags
    pub subjects: Vec<String>,

    /// Copyright/rights information
    pub rights: Option<String>,
}

impl BookMetadata {
    /// Create metadata with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Add an author/creator
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Set language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Title for display, falling back to a fixed label
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Get the primary author (first creator)
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(|s| s.as_str())
    }
}
