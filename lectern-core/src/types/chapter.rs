//! Normalized content of one spine item

use super::Block;
use serde::{Deserialize, Serialize};

/// Whether a chapter was normalized or replaced by a placeholder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    /// Content was normalized from the source document
    Normalized,

    /// Normalization failed; the content is an explanatory stub
    Placeholder { reason: String },
}

/// The normalized body of a single spine item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterContent {
    /// Archive path, same as the owning `SpineItem::href`
    pub href: String,

    /// Chapter title (TOC label, first heading, or file stem)
    pub title: String,

    /// The content blocks
    pub blocks: Vec<Block>,

    /// Element ids found in the source, in document order
    pub anchors: Vec<String>,

    /// Normalization outcome
    pub status: ChapterStatus,
}

impl ChapterContent {
    /// Create a normalized chapter
    pub fn new(href: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            href: href.into(),
            title: String::new(),
            blocks,
            anchors: Vec::new(),
            status: ChapterStatus::Normalized,
        }
    }

    /// Stub standing in for a chapter that could not be normalized
    pub fn placeholder(href: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let blocks = vec![Block::paragraph(vec![super::Inline::text(format!(
            "This chapter could not be displayed: {}",
            reason
        ))])];
        Self {
            href: href.into(),
            title: String::new(),
            blocks,
            anchors: Vec::new(),
            status: ChapterStatus::Placeholder { reason },
        }
    }

    /// Set the chapter title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the anchor list
    pub fn with_anchors(mut self, anchors: Vec<String>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.status, ChapterStatus::Placeholder { .. })
    }

    /// Text of the first heading in the chapter
    pub fn first_heading(&self) -> Option<String> {
        self.blocks.iter().find_map(|b| {
            b.heading_text()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
    }

    /// Whether `fragment` names an element of this chapter
    pub fn has_anchor(&self, fragment: &str) -> bool {
        self.anchors.iter().any(|a| a == fragment)
    }

    /// Plain-text rendering, paragraphs separated by blank lines
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            block.write_text(&mut out);
        }
        out.trim_end().to_string()
    }

    /// Normalized HTML rendering of the body
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            block.write_html(&mut out);
        }
        out
    }
}
