//! Lectern Core Library
//!
//! This crate opens EPUB containers, normalizes their chapters into a
//! renderable block tree, caches the resulting [`Book`] across runs and
//! remembers where the reader left off.

pub mod builder;
pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod insight;
pub mod normalize;
pub mod progress;
pub mod session;
pub mod storage;
pub mod types;

pub use builder::{BookBuilder, EpubBuilder};
pub use cache::BookCache;
pub use config::LecternConfig;
pub use container::{ContainerLoader, LoaderLimits, RawPackage};
pub use error::{
    CacheError, ContainerError, InsightError, LecternError, NormalizeError, RefTable, Result,
    StoreError,
};
pub use insight::{InsightClient, InsightConfig};
pub use normalize::normalize;
pub use progress::{MemoryProgressStore, MigrationOutcome, ProgressStore, SqliteProgressStore};
pub use session::ReadingSession;
pub use types::{
    Block, Book, BookId, BookMetadata, ChapterContent, ChapterStatus, CoverImage, Inline,
    LinkTarget, ReadingProgress, Resource, ResourceKind, SpineItem, Target, TocEntry,
};
