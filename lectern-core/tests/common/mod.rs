//! Shared fixtures: EPUB archives written on the fly with the zip writer

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One chapter of a fixture book
#[derive(Debug, Clone)]
pub struct FixtureChapter {
    pub id: String,
    /// Path relative to the package directory
    pub href: String,
    pub media_type: String,
    pub body: String,
    pub linear: bool,
}

/// How the fixture declares its navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    None,
    Ncx,
    NavDocument,
}

/// Builder for small EPUB archives
#[derive(Debug, Clone)]
pub struct EpubFixture {
    pub title: String,
    pub author: String,
    pub chapters: Vec<FixtureChapter>,
    pub navigation: Navigation,
    /// Extra `(label, src)` navigation entries appended after the chapters
    pub extra_nav: Vec<(String, String)>,
    pub cover: Option<Vec<u8>>,
    /// Extra spine idrefs, for dangling-reference tests
    pub extra_spine_refs: Vec<String>,
    /// Manifest hrefs that are declared but not written to the archive
    pub missing_entries: Vec<String>,
    pub write_container_xml: bool,
    /// Padding appended to the description, to change the file size
    pub padding: usize,
}

impl Default for EpubFixture {
    fn default() -> Self {
        Self {
            title: "Fixture Book".to_string(),
            author: "Ada Writer".to_string(),
            chapters: Vec::new(),
            navigation: Navigation::Ncx,
            extra_nav: Vec::new(),
            cover: None,
            extra_spine_refs: Vec::new(),
            missing_entries: Vec::new(),
            write_container_xml: true,
            padding: 0,
        }
    }
}

pub fn chapter_html(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title><style>p {{ margin: 0 }}</style></head>
<body>
<h1 id="top">{title}</h1>
{body}
<script>document.write("nope")</script>
</body>
</html>"#
    )
}

impl EpubFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A book with `n` plain chapters
    pub fn with_chapters(n: usize) -> Self {
        let mut fixture = Self::default();
        for i in 1..=n {
            fixture = fixture.chapter(
                &format!("ch{}", i),
                &format!("text/chapter{}.xhtml", i),
                &chapter_html(
                    &format!("Chapter {}", i),
                    &format!("<p id=\"p{i}\">Paragraph of chapter {i}.</p>"),
                ),
            );
        }
        fixture
    }

    pub fn chapter(mut self, id: &str, href: &str, body: &str) -> Self {
        self.chapters.push(FixtureChapter {
            id: id.to_string(),
            href: href.to_string(),
            media_type: "application/xhtml+xml".to_string(),
            body: body.to_string(),
            linear: true,
        });
        self
    }

    pub fn raw_chapter(mut self, chapter: FixtureChapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn nav_entry(mut self, label: &str, src: &str) -> Self {
        self.extra_nav.push((label.to_string(), src.to_string()));
        self
    }

    pub fn cover(mut self, bytes: &[u8]) -> Self {
        self.cover = Some(bytes.to_vec());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    fn manifest_xml(&self) -> String {
        let mut items = String::new();
        for ch in &self.chapters {
            items.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
                ch.id, ch.href, ch.media_type
            ));
        }
        match self.navigation {
            Navigation::Ncx => {
                items.push_str("    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n")
            }
            Navigation::NavDocument => items.push_str(
                "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
            ),
            Navigation::None => {}
        }
        if self.cover.is_some() {
            items.push_str(
                "    <item id=\"cover-img\" href=\"images/cover.png\" media-type=\"image/png\"/>\n",
            );
        }
        items
    }

    fn package_xml(&self) -> String {
        let spine_toc = if self.navigation == Navigation::Ncx {
            " toc=\"ncx\""
        } else {
            ""
        };
        let mut itemrefs = String::new();
        for ch in &self.chapters {
            let linear = if ch.linear { "" } else { " linear=\"no\"" };
            itemrefs.push_str(&format!("    <itemref idref=\"{}\"{}/>\n", ch.id, linear));
        }
        for idref in &self.extra_spine_refs {
            itemrefs.push_str(&format!("    <itemref idref=\"{}\"/>\n", idref));
        }
        let cover_meta = if self.cover.is_some() {
            "    <meta name=\"cover\" content=\"cover-img\"/>\n"
        } else {
            ""
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{title}</dc:title>
    <dc:creator>{author}</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:uuid:fixture</dc:identifier>
    <dc:description>A fixture{padding}</dc:description>
{cover_meta}  </metadata>
  <manifest>
{items}  </manifest>
  <spine{spine_toc}>
{itemrefs}  </spine>
</package>"#,
            title = self.title,
            author = self.author,
            padding = " ".repeat(self.padding),
            cover_meta = cover_meta,
            items = self.manifest_xml(),
            spine_toc = spine_toc,
            itemrefs = itemrefs,
        )
    }

    fn nav_targets(&self) -> Vec<(String, String)> {
        let mut targets: Vec<(String, String)> = self
            .chapters
            .iter()
            .filter(|c| c.linear)
            .enumerate()
            .map(|(i, c)| (format!("Contents {}", i + 1), c.href.clone()))
            .collect();
        targets.extend(self.extra_nav.iter().cloned());
        targets
    }

    fn ncx_xml(&self) -> String {
        let mut points = String::new();
        for (i, (label, src)) in self.nav_targets().iter().enumerate() {
            points.push_str(&format!(
                "    <navPoint id=\"np{i}\" playOrder=\"{order}\"><navLabel><text>{label}</text></navLabel><content src=\"{src}\"/></navPoint>\n",
                i = i,
                order = i + 1,
                label = label,
                src = src
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:fixture"/></head>
  <docTitle><text>{}</text></docTitle>
  <navMap>
{}  </navMap>
</ncx>"#,
            self.title, points
        )
    }

    fn nav_xhtml(&self) -> String {
        let mut items = String::new();
        for (label, src) in self.nav_targets() {
            items.push_str(&format!("      <li><a href=\"{}\">{}</a></li>\n", src, label));
        }
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Contents</title></head>
<body>
  <nav epub:type="toc">
    <ol>
{}    </ol>
  </nav>
</body>
</html>"#,
            items
        )
    }

    /// Serialize the archive
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut out));
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            let deflated =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            zip.start_file("mimetype", stored).unwrap();
            zip.write_all(b"application/epub+zip").unwrap();

            if self.write_container_xml {
                zip.start_file("META-INF/container.xml", deflated).unwrap();
                zip.write_all(
                    br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
                )
                .unwrap();
            }

            zip.start_file("OEBPS/content.opf", deflated).unwrap();
            zip.write_all(self.package_xml().as_bytes()).unwrap();

            for ch in &self.chapters {
                if self.missing_entries.contains(&ch.href) {
                    continue;
                }
                zip.start_file(format!("OEBPS/{}", ch.href), deflated).unwrap();
                zip.write_all(ch.body.as_bytes()).unwrap();
            }

            match self.navigation {
                Navigation::Ncx => {
                    zip.start_file("OEBPS/toc.ncx", deflated).unwrap();
                    zip.write_all(self.ncx_xml().as_bytes()).unwrap();
                }
                Navigation::NavDocument => {
                    zip.start_file("OEBPS/nav.xhtml", deflated).unwrap();
                    zip.write_all(self.nav_xhtml().as_bytes()).unwrap();
                }
                Navigation::None => {}
            }

            if let Some(cover) = &self.cover {
                zip.start_file("OEBPS/images/cover.png", stored).unwrap();
                zip.write_all(cover).unwrap();
            }

            zip.finish().unwrap();
        }
        out
    }

    /// Write the archive into `dir` and return its path
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

/// Minimal PNG header bytes, enough to stand in for an image
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
