//! Resource kinds and embedded assets (images, cover)

use serde::{Deserialize, Serialize};

/// Closed classification of manifest resources, decided from the declared
/// media type when the manifest is parsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Document,
    Image,
    Stylesheet,
    Font,
    Other,
}

impl ResourceKind {
    /// Classify a declared media type. Parameters (`; charset=...`) and case
    /// are ignored.
    pub fn from_media_type(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/xhtml+xml" | "text/html" | "application/x-dtbook+xml" | "text/plain" => {
                ResourceKind::Document
            }
            "text/css" => ResourceKind::Stylesheet,
            "application/vnd.ms-opentype"
            | "application/font-sfnt"
            | "application/font-woff"
            | "application/x-font-ttf"
            | "application/x-font-otf"
            | "application/x-font-truetype"
            | "application/x-font-opentype" => ResourceKind::Font,
            s if s.starts_with("image/") => ResourceKind::Image,
            s if s.starts_with("font/") => ResourceKind::Font,
            _ => ResourceKind::Other,
        }
    }
}

/// A single binary resource carried by a Book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// MIME type (e.g., "image/png")
    pub media_type: String,

    /// Raw bytes as stored in the container
    pub data: Vec<u8>,
}

impl Resource {
    /// Create a new resource
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The resolved cover image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverImage {
    /// Archive path the cover was read from
    pub href: String,

    /// Image bytes and media type
    pub resource: Resource,
}
