//! Runtime configuration

use crate::container::LoaderLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "./lectern_data";

/// Where Lectern keeps its cache and progress database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LecternConfig {
    /// Base directory for everything Lectern writes
    pub data_dir: PathBuf,

    /// Root of the book cache; entries live under `books/`
    pub cache_dir: PathBuf,

    /// SQLite database holding reading progress
    pub database_path: PathBuf,

    /// Bounds applied while opening containers
    #[serde(default)]
    pub limits: LoaderLimits,
}

impl Default for LecternConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

impl LecternConfig {
    /// Derive cache and database locations from a data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            cache_dir: data_dir.join("cache"),
            database_path: data_dir.join("progress.db"),
            data_dir,
            limits: LoaderLimits::default(),
        }
    }

    /// Read `LECTERN_DATA_DIR`, `LECTERN_CACHE_DIR` and
    /// `LECTERN_DATABASE_PATH`; unset variables keep their defaults
    pub fn from_env() -> Self {
        let data_dir =
            std::env::var("LECTERN_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let mut config = Self::with_data_dir(data_dir);

        if let Ok(cache_dir) = std::env::var("LECTERN_CACHE_DIR") {
            config.cache_dir = PathBuf::from(cache_dir);
        }
        if let Ok(database_path) = std::env::var("LECTERN_DATABASE_PATH") {
            config.database_path = PathBuf::from(database_path);
        }
        config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_data_dir() {
        let config = LecternConfig::with_data_dir("/tmp/lectern");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/lectern/cache"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/lectern/progress.db"));
    }

    #[test]
    fn test_config_serializes() {
        let config = LecternConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LecternConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.database_path, config.database_path);
        assert_eq!(back.limits.max_entries, config.limits.max_entries);
    }
}
