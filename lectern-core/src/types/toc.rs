//! Table of contents types

use serde::{Deserialize, Serialize};

/// A navigation target inside the book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Target {
    /// Archive path of the content document
    pub href: String,

    /// Optional fragment (element id) within the document
    pub fragment: Option<String>,
}

impl Target {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Split a `path#fragment` reference. An empty fragment is dropped.
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('#') {
            Some((href, frag)) if !frag.is_empty() => Self::new(href).with_fragment(frag),
            Some((href, _)) => Self::new(href),
            None => Self::new(reference),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.fragment {
            Some(frag) => write!(f, "{}#{}", self.href, frag),
            None => f.write_str(&self.href),
        }
    }
}

/// A single entry in the table of contents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    /// Display title
    pub title: String,

    /// Where the entry points
    pub target: Target,

    /// Child entries for nested TOC
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// Create a new TOC entry
    pub fn new(title: impl Into<String>, target: Target) -> Self {
        Self {
            title: title.into(),
            target,
            children: Vec::new(),
        }
    }

    /// Add child entries
    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }

    /// Add a single child entry
    pub fn add_child(&mut self, child: TocEntry) {
        self.children.push(child);
    }

    /// Depth of the subtree rooted at this entry (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TocEntry::depth).max().unwrap_or(0)
    }

    /// Pre-order walk of this entry and all descendants
    pub fn walk(&self) -> Vec<&TocEntry> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}
