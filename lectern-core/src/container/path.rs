//! Archive path helpers
//!
//! Hrefs inside a package are relative to the document that contains them
//! and may be percent-encoded. Everything in the book model is keyed by the
//! resolved, decoded archive path.

use percent_encoding::percent_decode_str;

/// Directory part of an archive path ("OEBPS/content.opf" -> "OEBPS")
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Whether a reference carries a URI scheme (http:, mailto:, data:, ...)
pub fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(i) => {
            let scheme = &reference[..i];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Resolve `reference` (no fragment) against `base_dir`, decoding percent
/// escapes and collapsing `.` and `..` segments. Segments that would climb
/// above the archive root are dropped.
pub fn resolve(base_dir: &str, reference: &str) -> String {
    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();

    let joined_base = if decoded.starts_with('/') { "" } else { base_dir };
    for segment in joined_base.split('/').chain(decoded.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// File name without directories or extension
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Strip a UTF-8 BOM and decode as UTF-8, replacing invalid sequences
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
