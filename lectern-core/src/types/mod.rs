//! Core types for the Lectern book model

mod block;
mod book;
mod chapter;
mod metadata;
mod progress;
mod resource;
mod spine;
mod toc;

pub use block::{Block, Inline, LinkTarget};
pub use book::Book;
pub use chapter::{ChapterContent, ChapterStatus};
pub use metadata::BookMetadata;
pub use progress::{BookId, ReadingProgress};
pub use resource::{CoverImage, Resource, ResourceKind};
pub use spine::SpineItem;
pub use toc::{Target, TocEntry};
