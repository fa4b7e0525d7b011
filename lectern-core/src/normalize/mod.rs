//! Content normalization
//!
//! Turns one raw content document into a [`ChapterContent`]: scripts and
//! styles removed, internal links resolved to archive paths, element ids
//! recorded as anchors. Normalization is a pure function of its inputs.

mod html;

use crate::container::path;
use crate::error::NormalizeError;
use crate::types::{Block, ChapterContent, Inline};

use html::HtmlNormalizer;

/// Media types accepted as markup
const MARKUP_TYPES: &[&str] = &["application/xhtml+xml", "text/html", "application/xml", "text/xml"];

/// Normalize one content document.
///
/// `href` is the document's archive path; links and image sources inside it
/// are resolved relative to that path.
pub fn normalize(href: &str, data: &[u8], media_type: &str) -> Result<ChapterContent, NormalizeError> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let text = path::decode_text(data);
    if text.contains('\0') {
        return Err(NormalizeError::MalformedContent(format!(
            "{} contains binary data",
            href
        )));
    }

    if MARKUP_TYPES.contains(&essence.as_str()) {
        let (blocks, anchors) = HtmlNormalizer::new(href).normalize(&text);
        Ok(ChapterContent::new(href, blocks).with_anchors(anchors))
    } else if essence == "text/plain" {
        Ok(ChapterContent::new(href, plain_text_blocks(&text)))
    } else {
        Err(NormalizeError::UnsupportedMediaType(media_type.to_string()))
    }
}

/// Blank-line separated paragraphs
fn plain_text_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(Block::paragraph(vec![Inline::text(current.join(" "))]));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        blocks.push(Block::paragraph(vec![Inline::text(current.join(" "))]));
    }

    blocks
}
