//! Book cache
//!
//! Keeps built books in memory and on disk, keyed by source path. An entry is
//! valid while its stored [`SourceSignature`] matches the source file; any
//! unreadable, stale or foreign entry is rebuilt. Concurrent requests for the
//! same uncached book share a single build.

pub mod codec;

use crate::builder::BookBuilder;
use crate::error::{LecternError, Result, StorageError};
use crate::storage::{LocalStorage, StorageProvider};
use crate::types::{Book, BookId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Directory (storage prefix) holding cache entries
pub const ENTRY_DIR: &str = "books";

/// File extension of cache entries
pub const ENTRY_EXTENSION: &str = "lcache";

/// Size and modification time of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignature {
    pub size: u64,
    /// Nanoseconds since the Unix epoch
    pub modified_ns: u64,
}

impl SourceSignature {
    /// Read the signature of a file
    pub async fn of(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let modified_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Ok(Self {
            size: metadata.len(),
            modified_ns,
        })
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.size.to_le_bytes());
        out[8..].copy_from_slice(&self.modified_ns.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 16 {
            return None;
        }
        let (size, modified) = bytes.split_at(8);
        Some(Self {
            size: u64::from_le_bytes(size.try_into().ok()?),
            modified_ns: u64::from_le_bytes(modified.try_into().ok()?),
        })
    }
}

/// Storage path of the entry for a source file
pub fn entry_path(path: &Path) -> String {
    entry_path_for(&BookId::from_path(path))
}

fn entry_path_for(id: &BookId) -> String {
    format!("{}/{}.{}", ENTRY_DIR, id, ENTRY_EXTENSION)
}

#[derive(Debug)]
struct CachedBook {
    signature: SourceSignature,
    book: Arc<Book>,
}

type Slot = Arc<RwLock<Option<CachedBook>>>;

/// Cache of built books with single-flight builds
pub struct BookCache {
    storage: Arc<dyn StorageProvider>,
    builder: Arc<dyn BookBuilder>,
    slots: Mutex<HashMap<BookId, Slot>>,
}

impl BookCache {
    pub fn new(storage: Arc<dyn StorageProvider>, builder: Arc<dyn BookBuilder>) -> Self {
        Self {
            storage,
            builder,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cache whose entries live under a local directory
    pub fn local(cache_dir: impl Into<PathBuf>, builder: Arc<dyn BookBuilder>) -> Self {
        Self::new(Arc::new(LocalStorage::new(cache_dir)), builder)
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    async fn slot(&self, id: &BookId) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(id.clone()).or_default().clone()
    }

    /// Return the book for `path`, building it if no valid entry exists.
    ///
    /// Only build failures and an unreadable source surface as errors;
    /// problems with cache entries fall back to rebuilding.
    pub async fn get(&self, path: &Path) -> Result<Arc<Book>> {
        let id = BookId::from_path(path);
        let signature = SourceSignature::of(path).await?;
        let slot = self.slot(&id).await;

        {
            let guard = slot.read().await;
            if let Some(cached) = guard.as_ref().filter(|c| c.signature == signature) {
                debug!(book_id = %id, "Cache hit (memory)");
                return Ok(cached.book.clone());
            }
        }

        let mut guard = slot.write().await;
        // Another task may have filled the slot while we waited
        if let Some(cached) = guard.as_ref().filter(|c| c.signature == signature) {
            debug!(book_id = %id, "Cache hit after wait");
            return Ok(cached.book.clone());
        }

        let entry = entry_path_for(&id);
        if let Some(book) = self.load_entry(&entry, &signature).await {
            debug!(book_id = %id, "Cache hit (disk)");
            let book = Arc::new(book);
            *guard = Some(CachedBook {
                signature,
                book: book.clone(),
            });
            return Ok(book);
        }

        info!(book_id = %id, path = %path.display(), "Cache miss, building");
        let builder = self.builder.clone();
        let source = path.to_path_buf();
        let book = tokio::task::spawn_blocking(move || builder.build(&source))
            .await
            .map_err(|e| LecternError::Task(e.to_string()))??;

        self.store_entry(&entry, &signature, &book).await;

        let book = Arc::new(book);
        *guard = Some(CachedBook {
            signature,
            book: book.clone(),
        });
        Ok(book)
    }

    /// Discard the memory and disk entries for `path`
    pub async fn invalidate(&self, path: &Path) -> Result<()> {
        let id = BookId::from_path(path);
        let slot = self.slot(&id).await;
        let mut guard = slot.write().await;
        *guard = None;

        let deleted = match self.storage.delete(&entry_path_for(&id)).await {
            Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        };

        self.release_slot(&id, &slot).await;
        drop(guard);

        deleted?;
        debug!(book_id = %id, "Cache entry invalidated");
        Ok(())
    }

    /// Drop the map entry for `id` unless another task still holds the slot.
    ///
    /// The map lock is never held while waiting on a slot, so taking it here
    /// under the slot's write guard cannot deadlock.
    async fn release_slot(&self, id: &BookId, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        let unshared = slots
            .get(id)
            .map(|held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2)
            .unwrap_or(false);
        if unshared {
            slots.remove(id);
        }
    }

    /// Number of books with a live slot
    pub async fn slot_count(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Read and validate a disk entry; `None` means rebuild
    async fn load_entry(&self, entry: &str, signature: &SourceSignature) -> Option<Book> {
        let bytes = match self.storage.read(entry).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return None,
            Err(e) => {
                warn!(entry, error = %e, "Cache entry unreadable, rebuilding");
                return None;
            }
        };

        match codec::decode(&bytes) {
            Ok((stored, book)) if stored == *signature => Some(book),
            Ok(_) => {
                debug!(entry, "Cache entry stale, rebuilding");
                None
            }
            Err(e) => {
                warn!(entry, error = %e, "Discarding cache entry");
                None
            }
        }
    }

    async fn store_entry(&self, entry: &str, signature: &SourceSignature, book: &Book) {
        let bytes = match codec::encode(signature, book) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(entry, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.storage.write(entry, bytes).await {
            warn!(entry, error = %e, "Failed to write cache entry");
        }
    }
}
