//! Book model builder: container + normalized chapters -> [`Book`]

use crate::container::{path, ContainerLoader, LoaderLimits, RawPackage};
use crate::error::Result;
use crate::normalize::normalize;
use crate::types::{Book, ChapterContent, Target, TocEntry};
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};

/// Builds a [`Book`] from a source file.
///
/// Builds are synchronous units of work; async callers run them on a
/// blocking thread.
pub trait BookBuilder: Send + Sync {
    fn build(&self, path: &Path) -> Result<Book>;
}

/// Builder for zip-based EPUB containers
#[derive(Debug, Clone, Default)]
pub struct EpubBuilder {
    loader: ContainerLoader,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: LoaderLimits) -> Self {
        Self {
            loader: ContainerLoader::with_limits(limits),
        }
    }

    /// Build from any seekable byte source
    pub fn build_from_reader<R: Read + Seek>(&self, reader: R) -> Result<Book> {
        let package = self.loader.load_from_reader(reader)?;
        Ok(assemble(package))
    }
}

impl BookBuilder for EpubBuilder {
    fn build(&self, path: &Path) -> Result<Book> {
        info!(path = %path.display(), "Building book");
        let package = self.loader.load(path)?;
        let book = assemble(package);
        info!(
            title = %book.title(),
            chapters = book.len(),
            degraded = book.degraded_chapters().count(),
            "Built book"
        );
        Ok(book)
    }
}

/// Normalize every spine document and assemble the Book.
///
/// Chapters are normalized independently in spine order. A chapter that
/// fails to normalize becomes a placeholder; the book is still returned.
///
/// Packages from [`ContainerLoader`](crate::container::ContainerLoader)
/// always carry every spine document. Packages assembled by hand may not,
/// and a spine item without its document also becomes a placeholder.
pub fn assemble(package: RawPackage) -> Book {
    let RawPackage {
        metadata,
        spine,
        mut toc,
        documents,
        cover,
        images,
        ..
    } = package;

    let toc_titles = toc_titles(&toc);
    let mut chapters = BTreeMap::new();

    for item in &spine {
        let chapter = match documents.get(&item.href) {
            Some(bytes) => match normalize(&item.href, bytes, &item.media_type) {
                Ok(chapter) => chapter,
                Err(e) => {
                    warn!(href = %item.href, error = %e, "Chapter degraded to placeholder");
                    ChapterContent::placeholder(&item.href, e.to_string())
                }
            },
            None => {
                warn!(href = %item.href, "Spine document missing from package");
                ChapterContent::placeholder(&item.href, "document missing from container")
            }
        };

        let title = toc_titles
            .get(item.href.as_str())
            .map(|t| t.to_string())
            .or_else(|| chapter.first_heading())
            .unwrap_or_else(|| path::file_stem(&item.href).to_string());

        debug!(ordinal = item.ordinal, href = %item.href, title = %title, "Normalized chapter");
        chapters.insert(item.href.clone(), chapter.with_title(title));
    }

    if toc.is_empty() {
        toc = spine
            .iter()
            .filter(|item| item.linear)
            .filter_map(|item| {
                chapters
                    .get(&item.href)
                    .map(|c| TocEntry::new(c.title.clone(), Target::new(&item.href)))
            })
            .collect();
        debug!(entries = toc.len(), "Generated table of contents from spine");
    }

    Book {
        metadata,
        spine,
        toc,
        chapters,
        cover,
        images,
    }
}

/// First non-empty TOC label pointing at each document, in pre-order
fn toc_titles(toc: &[TocEntry]) -> HashMap<&str, &str> {
    let mut titles = HashMap::new();
    for entry in toc.iter().flat_map(TocEntry::walk) {
        let title = entry.title.trim();
        if !title.is_empty() {
            titles.entry(entry.target.href.as_str()).or_insert(title);
        }
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Manifest;
    use crate::types::{BookMetadata, SpineItem};

    fn spine_item(ordinal: usize, href: &str, media_type: &str, linear: bool) -> SpineItem {
        SpineItem {
            ordinal,
            href: href.to_string(),
            id: format!("item{}", ordinal),
            media_type: media_type.to_string(),
            linear,
        }
    }

    fn package(toc: Vec<TocEntry>) -> RawPackage {
        let mut documents = HashMap::new();
        documents.insert(
            "text/a.xhtml".to_string(),
            b"<html><body><h1>Heading A</h1><p>a</p></body></html>".to_vec(),
        );
        documents.insert(
            "text/b.xhtml".to_string(),
            b"<html><body><p>no heading</p></body></html>".to_vec(),
        );
        documents.insert("text/c.svg".to_string(), b"<svg/>".to_vec());

        RawPackage {
            package_path: "content.opf".to_string(),
            metadata: BookMetadata::titled("Sample"),
            manifest: Manifest::default(),
            spine: vec![
                spine_item(0, "text/a.xhtml", "application/xhtml+xml", true),
                spine_item(1, "text/b.xhtml", "application/xhtml+xml", true),
                spine_item(2, "text/c.svg", "image/svg+xml", false),
            ],
            toc,
            documents,
            cover: None,
            images: BTreeMap::new(),
            stylesheets: BTreeMap::new(),
        }
    }

    #[test]
    fn test_titles_fall_back_to_heading_then_stem() {
        let book = assemble(package(Vec::new()));
        assert_eq!(book.chapter(0).unwrap().title, "Heading A");
        assert_eq!(book.chapter(1).unwrap().title, "b");
    }

    #[test]
    fn test_toc_label_wins_over_heading() {
        let toc = vec![TocEntry::new("From TOC", Target::new("text/a.xhtml"))];
        let book = assemble(package(toc));
        assert_eq!(book.chapter(0).unwrap().title, "From TOC");
        assert_eq!(book.toc.len(), 1);
    }

    #[test]
    fn test_unsupported_spine_item_becomes_placeholder() {
        let book = assemble(package(Vec::new()));
        let degraded: Vec<_> = book.degraded_chapters().map(|c| c.href.as_str()).collect();
        assert_eq!(degraded, vec!["text/c.svg"]);
        assert!(book.chapter(2).unwrap().plain_text().contains("image/svg+xml"));
    }

    #[test]
    fn test_hand_built_package_without_document() {
        let mut raw = package(Vec::new());
        raw.documents.remove("text/b.xhtml");
        let book = assemble(raw);
        let degraded: Vec<_> = book.degraded_chapters().map(|c| c.href.as_str()).collect();
        assert_eq!(degraded, vec!["text/b.xhtml", "text/c.svg"]);
        assert!(book
            .chapter(1)
            .unwrap()
            .plain_text()
            .contains("document missing from container"));
    }

    #[test]
    fn test_fallback_toc_covers_linear_items() {
        let book = assemble(package(Vec::new()));
        let hrefs: Vec<_> = book.toc.iter().map(|e| e.target.href.as_str()).collect();
        assert_eq!(hrefs, vec!["text/a.xhtml", "text/b.xhtml"]);
    }
}
