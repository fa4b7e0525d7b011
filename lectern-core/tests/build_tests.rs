//! Book building tests: loader + normalizer + builder end to end

mod common;

use common::{chapter_html, EpubFixture, FixtureChapter, Navigation};
use lectern_core::types::{Block, Inline, LinkTarget, Target};
use lectern_core::{BookBuilder, ContainerError, EpubBuilder, LecternError};
use proptest::prelude::*;
use std::io::Cursor;

fn build(fixture: &EpubFixture) -> lectern_core::Result<lectern_core::Book> {
    EpubBuilder::new().build_from_reader(Cursor::new(fixture.to_bytes()))
}

#[test]
fn test_build_three_chapter_book() {
    let book = build(&EpubFixture::with_chapters(3)).unwrap();

    assert_eq!(book.title(), "Fixture Book");
    assert_eq!(book.len(), 3);
    assert_eq!(book.chapters.len(), 3);
    assert_eq!(book.degraded_chapters().count(), 0);

    let first = book.chapter(0).unwrap();
    assert_eq!(first.title, "Contents 1");
    assert!(first.has_anchor("top"));
    assert!(first.has_anchor("p1"));
    assert!(first.plain_text().contains("Paragraph of chapter 1."));
    assert!(!first.plain_text().contains("nope"));
    assert!(!first.to_html().contains("<script"));
}

#[test]
fn test_every_toc_target_resolves() {
    let book = build(&EpubFixture::with_chapters(3).nav_entry("Two, para", "text/chapter2.xhtml#p2"))
        .unwrap();
    for entry in book.toc_entries() {
        let ordinal = book.resolve(&entry.target).expect("target in spine");
        let chapter = book.chapter(ordinal).unwrap();
        if let Some(fragment) = &entry.target.fragment {
            assert!(chapter.has_anchor(fragment), "missing anchor {}", fragment);
        }
    }
}

#[test]
fn test_titles_from_heading_without_navigation() {
    let book = build(&EpubFixture::with_chapters(2).navigation(Navigation::None)).unwrap();
    assert_eq!(book.chapter(1).unwrap().title, "Chapter 2");
    // Generated one entry per linear spine item
    let titles: Vec<_> = book.toc.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Chapter 1", "Chapter 2"]);
}

#[test]
fn test_intra_book_links_resolved() {
    let body = r##"<p><a href="chapter2.xhtml#p2">next</a> <a href="#top">top</a>
        <a href="http://example.org">web</a></p>"##;
    let fixture = EpubFixture::with_chapters(2).chapter(
        "links",
        "text/links.xhtml",
        &chapter_html("Links", body),
    );
    let book = build(&fixture).unwrap();
    let chapter = book.chapter_by_href("OEBPS/text/links.xhtml").unwrap();

    let mut targets = Vec::new();
    for block in &chapter.blocks {
        if let Block::Paragraph(inlines) = block {
            for inline in inlines {
                if let Inline::Link { target, .. } = inline {
                    targets.push(target.clone());
                }
            }
        }
    }
    assert_eq!(
        targets,
        vec![
            LinkTarget::Internal(Target::new("OEBPS/text/chapter2.xhtml").with_fragment("p2")),
            LinkTarget::Internal(Target::new("OEBPS/text/links.xhtml").with_fragment("top")),
            LinkTarget::External("http://example.org".to_string()),
        ]
    );
}

#[test]
fn test_unsupported_chapter_degrades_to_placeholder() {
    let fixture = EpubFixture::with_chapters(2).raw_chapter(FixtureChapter {
        id: "drawing".to_string(),
        href: "images/drawing.svg".to_string(),
        media_type: "image/svg+xml".to_string(),
        body: "<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_string(),
        linear: true,
    });
    let book = build(&fixture).unwrap();

    assert_eq!(book.len(), 3);
    let degraded: Vec<_> = book.degraded_chapters().map(|c| c.href.clone()).collect();
    assert_eq!(degraded, vec!["OEBPS/images/drawing.svg".to_string()]);
    assert!(book.chapter(0).map(|c| !c.is_placeholder()).unwrap_or(false));
}

#[test]
fn test_loader_errors_are_fatal() {
    let mut fixture = EpubFixture::with_chapters(1);
    fixture.extra_spine_refs.push("ghost".to_string());
    let err = build(&fixture).unwrap_err();
    assert!(matches!(
        err,
        LecternError::Container(ContainerError::BrokenReference { .. })
    ));
}

#[test]
fn test_build_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = EpubFixture::with_chapters(2).write_to(dir.path(), "b.epub");
    let book = EpubBuilder::new().build(&path).unwrap();
    assert_eq!(book.len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_spine_ordinals_dense(n in 1usize..12) {
        let book = build(&EpubFixture::with_chapters(n)).unwrap();
        let ordinals: Vec<usize> = book.spine.iter().map(|s| s.ordinal).collect();
        prop_assert_eq!(ordinals, (0..n).collect::<Vec<_>>());
        prop_assert_eq!(book.chapters.len(), n);
    }

    #[test]
    fn prop_build_is_deterministic(n in 1usize..6, words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
        let body = format!("<p>{}</p>", words.join(" "));
        let fixture = EpubFixture::with_chapters(n).chapter("extra", "text/extra.xhtml", &chapter_html("Extra", &body));
        let bytes = fixture.to_bytes();
        let first = EpubBuilder::new().build_from_reader(Cursor::new(bytes.clone())).unwrap();
        let second = EpubBuilder::new().build_from_reader(Cursor::new(bytes)).unwrap();
        prop_assert_eq!(first, second);
    }
}
