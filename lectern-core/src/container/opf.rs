//! Package document parsing (container.xml and the OPF)

use crate::types::BookMetadata;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A manifest `<item>` as declared, href not yet resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeclaredItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
}

/// A spine `<itemref>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeclaredItemRef {
    pub idref: String,
    pub linear: bool,
}

/// A legacy `<guide><reference>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GuideReference {
    pub kind: String,
    pub href: String,
}

/// Everything read from the package document
#[derive(Debug, Default)]
pub(crate) struct PackageDocument {
    pub metadata: BookMetadata,
    pub manifest: Vec<DeclaredItem>,
    pub spine: Vec<DeclaredItemRef>,
    /// `toc` attribute of `<spine>` (NCX manifest id)
    pub spine_toc: Option<String>,
    /// `<meta name="cover" content="...">`
    pub cover_meta: Option<String>,
    pub guide: Vec<GuideReference>,
}

/// Find the `full-path` of the first rootfile in META-INF/container.xml
pub(crate) fn parse_container_xml(content: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path") {
                    if !path.is_empty() {
                        return Ok(Some(path));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Dublin Core elements we keep, by local name
const DC_FIELDS: &[&str] = &[
    "title",
    "creator",
    "language",
    "identifier",
    "date",
    "description",
    "publisher",
    "subject",
    "rights",
];

/// Parse an OPF package document
pub(crate) fn parse_package(content: &str) -> Result<PackageDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut doc = PackageDocument::default();
    let mut in_metadata = false;
    let mut current_field: Option<&'static str> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                let name = local.as_ref();
                if name == b"metadata" {
                    in_metadata = true;
                } else if !read_declaration(name, &e, &mut doc) && in_metadata {
                    current_field = DC_FIELDS.iter().find(|f| f.as_bytes() == name).copied();
                    text.clear();
                }
            }
            Event::Empty(e) => {
                read_declaration(e.local_name().as_ref(), &e, &mut doc);
            }
            Event::Text(e) => {
                if current_field.is_some() {
                    match e.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Event::CData(e) => {
                if current_field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                if local.as_ref() == b"metadata" {
                    in_metadata = false;
                }
                if let Some(field) = current_field.take() {
                    store_field(&mut doc.metadata, field, text.trim());
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

fn store_field(metadata: &mut BookMetadata, field: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let value = value.to_string();
    // Single-valued fields keep the first declaration.
    match field {
        "title" => {
            metadata.title.get_or_insert(value);
        }
        "creator" => metadata.authors.push(value),
        "language" => {
            metadata.language.get_or_insert(value);
        }
        "identifier" => {
            metadata.identifier.get_or_insert(value);
        }
        "date" => {
            metadata.date.get_or_insert(value);
        }
        "description" => {
            metadata.description.get_or_insert(value);
        }
        "publisher" => {
            metadata.publisher.get_or_insert(value);
        }
        "subject" => metadata.subjects.push(value),
        "rights" => {
            metadata.rights.get_or_insert(value);
        }
        _ => {}
    }
}

/// Record a manifest, spine or guide declaration. Packages write these both
/// self-closing and with an end tag; returns false for any other element.
fn read_declaration(name: &[u8], e: &BytesStart<'_>, doc: &mut PackageDocument) -> bool {
    match name {
        b"item" => {
            let id = attr(e, b"id").unwrap_or_default();
            if !id.is_empty() {
                doc.manifest.push(DeclaredItem {
                    id,
                    href: attr(e, b"href").unwrap_or_default(),
                    media_type: attr(e, b"media-type").unwrap_or_default(),
                    properties: attr(e, b"properties")
                        .map(|p| p.split_ascii_whitespace().map(str::to_string).collect())
                        .unwrap_or_default(),
                });
            }
        }
        b"itemref" => {
            if let Some(idref) = attr(e, b"idref") {
                let linear = attr(e, b"linear").map_or(true, |v| v.trim() != "no");
                doc.spine.push(DeclaredItemRef { idref, linear });
            }
        }
        b"meta" => read_cover_meta(e, doc),
        b"reference" => {
            if let (Some(kind), Some(href)) = (attr(e, b"type"), attr(e, b"href")) {
                doc.guide.push(GuideReference { kind, href });
            }
        }
        b"spine" => doc.spine_toc = attr(e, b"toc"),
        _ => return false,
    }
    true
}

fn read_cover_meta(e: &BytesStart<'_>, doc: &mut PackageDocument) {
    if attr(e, b"name").as_deref() == Some("cover") {
        if let Some(content) = attr(e, b"content").filter(|c| !c.is_empty()) {
            doc.cover_meta = Some(content);
        }
    }
}

/// Unescaped value of an attribute, matched by local name
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| match a.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_xml() {
        let xml = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;
        assert_eq!(
            parse_container_xml(xml).unwrap().as_deref(),
            Some("OEBPS/content.opf")
        );
        assert_eq!(parse_container_xml("<container/>").unwrap(), None);
    }

    #[test]
    fn test_parse_package() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Evicted</dc:title>
    <dc:creator opf:role="aut">Matthew Desmond</dc:creator>
    <dc:creator>Second &amp; Author</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:isbn:9780553447439</dc:identifier>
    <dc:identifier>second-id</dc:identifier>
    <dc:date>2016-03-01</dc:date>
    <dc:subject>Poverty</dc:subject>
    <meta name="cover" content="cover-img"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="text/c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav scripted"/>
    <item id="cover-img" href="images/cover.jpg" media-type="image/jpeg"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="c1"/>
    <itemref idref="nav" linear="no"/>
  </spine>
  <guide>
    <reference type="cover" title="Cover" href="text/cover.xhtml"/>
  </guide>
</package>"#;

        let doc = parse_package(opf).unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Evicted"));
        assert_eq!(
            doc.metadata.authors,
            vec!["Matthew Desmond".to_string(), "Second & Author".to_string()]
        );
        assert_eq!(doc.metadata.identifier.as_deref(), Some("urn:isbn:9780553447439"));
        assert_eq!(doc.metadata.date.as_deref(), Some("2016-03-01"));
        assert_eq!(doc.metadata.subjects, vec!["Poverty".to_string()]);
        assert_eq!(doc.manifest.len(), 4);
        assert_eq!(doc.manifest[2].properties, vec!["nav", "scripted"]);
        assert_eq!(
            doc.spine,
            vec![
                DeclaredItemRef { idref: "c1".into(), linear: true },
                DeclaredItemRef { idref: "nav".into(), linear: false },
            ]
        );
        assert_eq!(doc.spine_toc.as_deref(), Some("ncx"));
        assert_eq!(doc.cover_meta.as_deref(), Some("cover-img"));
        assert_eq!(doc.guide[0].kind, "cover");
    }

    #[test]
    fn test_declarations_with_end_tags() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Long Form</dc:title>
    <meta name="cover" content="img"></meta>
  </metadata>
  <manifest>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"></item>
    <item id="img" href="img.png" media-type="image/png" properties="cover-image"></item>
  </manifest>
  <spine toc="ncx">
    <itemref idref="c1"></itemref>
    <itemref idref="img" linear="no"></itemref>
  </spine>
  <guide>
    <reference type="toc" href="c1.xhtml"></reference>
  </guide>
</package>"#;

        let doc = parse_package(opf).unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Long Form"));
        assert_eq!(doc.manifest.len(), 2);
        assert_eq!(doc.manifest[0].href, "c1.xhtml");
        assert_eq!(doc.manifest[1].properties, vec!["cover-image"]);
        assert_eq!(
            doc.spine,
            vec![
                DeclaredItemRef { idref: "c1".into(), linear: true },
                DeclaredItemRef { idref: "img".into(), linear: false },
            ]
        );
        assert_eq!(doc.spine_toc.as_deref(), Some("ncx"));
        assert_eq!(doc.cover_meta.as_deref(), Some("img"));
        assert_eq!(doc.guide[0].kind, "toc");
    }

    #[test]
    fn test_malformed_package_is_an_error() {
        assert!(parse_package("<package><metadata></package>").is_err());
    }
}
