//! Spine (linear reading order) types

use serde::{Deserialize, Serialize};

/// One entry of the reading order.
///
/// `ordinal` is the position in the spine: zero-based, dense, unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpineItem {
    /// Zero-based position in the reading order
    pub ordinal: usize,

    /// Archive path of the content document
    pub href: String,

    /// Manifest id the item was resolved from
    pub id: String,

    /// Declared media type of the content document
    pub media_type: String,

    /// False for `linear="no"` items (notes, auxiliary pages)
    pub linear: bool,
}
