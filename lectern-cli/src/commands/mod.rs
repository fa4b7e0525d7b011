//! CLI command implementations

mod info;
mod insight;
mod inspect;
mod progress;
mod read;
mod warm;

pub use info::{info, toc};
pub use insight::{discuss, explain};
pub use inspect::{dump_cache, images};
pub use progress::{migrate, progress_list, progress_reset, progress_set, progress_show};
pub use read::{read, Step};
pub use warm::warm;

use anyhow::{Context, Result};
use lectern_core::{BookCache, EpubBuilder, LecternConfig, SqliteProgressStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration shared by every command
pub struct AppContext {
    pub config: LecternConfig,
}

impl AppContext {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let config = match data_dir {
            Some(dir) => LecternConfig::with_data_dir(dir),
            None => LecternConfig::from_env(),
        };
        tracing::debug!(?config, "Loaded configuration");
        Self { config }
    }

    pub fn cache(&self) -> BookCache {
        let builder = EpubBuilder::with_limits(self.config.limits.clone());
        BookCache::local(self.config.cache_dir(), Arc::new(builder))
    }

    pub async fn progress_store(&self) -> Result<SqliteProgressStore> {
        let path = self.config.database_path();
        SqliteProgressStore::open(path)
            .await
            .with_context(|| format!("Failed to open progress database: {}", path.display()))
    }
}

/// Check that a book path exists before doing any work with it
pub fn book_path(input: &str) -> Result<&Path> {
    let path = Path::new(input);
    if !path.is_file() {
        anyhow::bail!("Book not found: {}", input);
    }
    Ok(path)
}
