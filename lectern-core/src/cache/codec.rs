//! On-disk cache entry format
//!
//! ```text
//! magic "LCTN" | u16 version (LE) | section*
//! section = u8 tag | u32 length (LE) | bytes
//! ```
//!
//! Tag 1 holds the source signature, tag 2 the bincode-encoded [`Book`].
//! Unknown tags are skipped so later versions can add sections.

use super::SourceSignature;
use crate::error::CacheError;
use crate::types::Book;

pub const MAGIC: &[u8; 4] = b"LCTN";

/// Bump whenever the Book layout or the section set changes
pub const FORMAT_VERSION: u16 = 1;

pub const TAG_SIGNATURE: u8 = 1;
pub const TAG_BOOK: u8 = 2;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// One tagged section, borrowed from the entry bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub tag: u8,
    pub data: &'a [u8],
}

/// Header and section table of an entry, read without checking the version
#[derive(Debug)]
pub struct EntryLayout<'a> {
    pub version: u16,
    pub sections: Vec<Section<'a>>,
}

impl<'a> EntryLayout<'a> {
    pub fn section(&self, tag: u8) -> Option<&'a [u8]> {
        self.sections.iter().find(|s| s.tag == tag).map(|s| s.data)
    }
}

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Encode a built book together with the signature of its source
pub fn encode(signature: &SourceSignature, book: &Book) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serde::encode_to_vec(book, bincode_config())
        .map_err(|e| CacheError::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + 2 * 5 + 16 + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    push_section(&mut out, TAG_SIGNATURE, &signature.to_bytes())?;
    push_section(&mut out, TAG_BOOK, &payload)?;
    Ok(out)
}

fn push_section(out: &mut Vec<u8>, tag: u8, data: &[u8]) -> Result<(), CacheError> {
    let len = u32::try_from(data.len())
        .map_err(|_| CacheError::Encode(format!("section {} exceeds 4 GiB", tag)))?;
    out.push(tag);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(data);
    Ok(())
}

/// Split an entry into its header and sections
pub fn layout(bytes: &[u8]) -> Result<EntryLayout<'_>, CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Corrupt("entry shorter than header".to_string()));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(CacheError::Corrupt("bad magic".to_string()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);

    let mut sections = Vec::new();
    let mut rest = &bytes[HEADER_LEN..];
    while !rest.is_empty() {
        if rest.len() < 5 {
            return Err(CacheError::Corrupt("truncated section header".to_string()));
        }
        let tag = rest[0];
        let len = u32::from_le_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        rest = &rest[5..];
        if rest.len() < len {
            return Err(CacheError::Corrupt(format!("section {} truncated", tag)));
        }
        sections.push(Section {
            tag,
            data: &rest[..len],
        });
        rest = &rest[len..];
    }

    Ok(EntryLayout { version, sections })
}

/// Read only the stored source signature
pub fn decode_signature(bytes: &[u8]) -> Result<SourceSignature, CacheError> {
    let layout = checked_layout(bytes)?;
    signature_of(&layout)
}

/// Decode a full entry
pub fn decode(bytes: &[u8]) -> Result<(SourceSignature, Book), CacheError> {
    let layout = checked_layout(bytes)?;
    let signature = signature_of(&layout)?;
    let payload = layout
        .section(TAG_BOOK)
        .ok_or_else(|| CacheError::Corrupt("missing book section".to_string()))?;
    let (book, _) = bincode::serde::decode_from_slice::<Book, _>(payload, bincode_config())
        .map_err(|e| CacheError::Corrupt(e.to_string()))?;
    Ok((signature, book))
}

fn checked_layout(bytes: &[u8]) -> Result<EntryLayout<'_>, CacheError> {
    let layout = layout(bytes)?;
    if layout.version != FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            found: layout.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(layout)
}

fn signature_of(layout: &EntryLayout<'_>) -> Result<SourceSignature, CacheError> {
    layout
        .section(TAG_SIGNATURE)
        .and_then(SourceSignature::from_bytes)
        .ok_or_else(|| CacheError::Corrupt("missing or invalid signature section".to_string()))
}
