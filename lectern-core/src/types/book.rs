//! The main Book type - the aggregate that is built, cached and read

use super::{BookMetadata, ChapterContent, CoverImage, Resource, SpineItem, Target, TocEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete, immutable book representation.
///
/// Maps are ordered so that encoding a Book is deterministic, which the
/// cache relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Book metadata (title, author, etc.)
    pub metadata: BookMetadata,

    /// Reading order
    pub spine: Vec<SpineItem>,

    /// Table of contents (top-level entries)
    pub toc: Vec<TocEntry>,

    /// Normalized chapters keyed by spine href
    pub chapters: BTreeMap<String, ChapterContent>,

    /// Cover image, if the package declares or implies one
    pub cover: Option<CoverImage>,

    /// Image resources keyed by archive path
    pub images: BTreeMap<String, Resource>,
}

impl Book {
    /// Get the book title
    pub fn title(&self) -> &str {
        self.metadata.display_title()
    }

    /// Number of spine items
    pub fn len(&self) -> usize {
        self.spine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spine.is_empty()
    }

    /// Chapter at a spine ordinal
    pub fn chapter(&self, ordinal: usize) -> Option<&ChapterContent> {
        self.spine
            .get(ordinal)
            .and_then(|item| self.chapters.get(&item.href))
    }

    /// Chapter by archive path
    pub fn chapter_by_href(&self, href: &str) -> Option<&ChapterContent> {
        self.chapters.get(href)
    }

    /// Spine ordinal of a document
    pub fn ordinal_of(&self, href: &str) -> Option<usize> {
        self.spine.iter().position(|item| item.href == href)
    }

    /// Resolve a navigation target to a spine ordinal
    pub fn resolve(&self, target: &Target) -> Option<usize> {
        self.ordinal_of(&target.href)
    }

    /// Chapters that had to be replaced by placeholders
    pub fn degraded_chapters(&self) -> impl Iterator<Item = &ChapterContent> {
        self.spine
            .iter()
            .filter_map(|item| self.chapters.get(&item.href))
            .filter(|c| c.is_placeholder())
    }

    /// Pre-order list of every TOC entry
    pub fn toc_entries(&self) -> Vec<&TocEntry> {
        self.toc.iter().flat_map(TocEntry::walk).collect()
    }
}
