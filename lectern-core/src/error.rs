//! Error types for Lectern Core

use std::fmt;
use thiserror::Error;

/// Result type alias using LecternError
pub type Result<T> = std::result::Result<T, LecternError>;

/// Top-level error type for all Lectern operations
#[derive(Debug, Error)]
pub enum LecternError {
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Progress store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Insight error: {0}")]
    Insight(#[from] InsightError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Where a dangling reference was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTable {
    /// A manifest item whose href has no archive entry
    Manifest,
    /// A spine itemref (or the spine `toc` attribute) naming an unknown id
    Spine,
    /// A navigation target naming no manifest resource
    Toc,
    /// A metadata cover pointer naming no manifest resource
    Metadata,
}

impl fmt::Display for RefTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefTable::Manifest => "manifest",
            RefTable::Spine => "spine",
            RefTable::Toc => "toc",
            RefTable::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Errors that occur while opening and resolving a container
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Missing package manifest: {0}")]
    MissingManifest(String),

    #[error("Broken reference: '{id}' in the {table} has no matching resource")]
    BrokenReference { id: String, table: RefTable },

    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),
}

impl ContainerError {
    pub(crate) fn broken(id: impl Into<String>, table: RefTable) -> Self {
        ContainerError::BrokenReference {
            id: id.into(),
            table,
        }
    }
}

/// Errors that occur while normalizing one chapter
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Malformed content: {0}")]
    MalformedContent(String),
}

/// Errors raised by the book cache. These never reach callers of
/// `BookCache::get`; they only decide whether an entry is rebuilt.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache format version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u16, expected: u16 },

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Errors raised by the progress store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Progress store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Errors raised while setting up the text-insight client. Request
/// failures are reported as text, not as errors.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Missing insight configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Could not create HTTP client: {0}")]
    Client(String),
}

/// Errors that occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_reference_names_id_and_table() {
        let err = ContainerError::broken("chap9", RefTable::Spine);
        let msg = err.to_string();
        assert!(msg.contains("chap9"));
        assert!(msg.contains("spine"));
    }
}
