//! Bounded access to the zip archive

use super::LoaderLimits;
use crate::error::ContainerError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::time::Instant;
use zip::ZipArchive;

/// A zip archive that enforces the loader's resource limits on every read.
pub(crate) struct Archive<R> {
    zip: ZipArchive<R>,
    limits: LoaderLimits,
    started: Instant,
    bytes_read: u64,
    /// Lowercased entry name -> actual entry name
    folded_names: HashMap<String, String>,
}

impl Archive<BufReader<File>> {
    /// Open an archive on disk
    pub fn open(path: &Path, limits: &LoaderLimits) -> Result<Self, ContainerError> {
        let file = File::open(path).map_err(|e| {
            ContainerError::MalformedContainer(format!("{}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file), limits)
    }
}

impl<R: Read + Seek> Archive<R> {
    pub fn from_reader(reader: R, limits: &LoaderLimits) -> Result<Self, ContainerError> {
        let started = Instant::now();
        let zip = ZipArchive::new(reader)
            .map_err(|e| ContainerError::MalformedContainer(e.to_string()))?;

        if zip.len() > limits.max_entries {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "archive has {} entries, limit is {}",
                zip.len(),
                limits.max_entries
            )));
        }

        let folded_names = zip
            .file_names()
            .map(|name| (name.to_lowercase(), name.to_string()))
            .collect();

        Ok(Self {
            zip,
            limits: limits.clone(),
            started,
            bytes_read: 0,
            folded_names,
        })
    }

    /// Fail once the time budget for this load is spent
    pub fn check_deadline(&self) -> Result<(), ContainerError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.limits.time_budget() {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "container load exceeded time budget of {}s",
                self.limits.time_budget_secs
            )));
        }
        Ok(())
    }

    /// Actual entry name for `name`, tolerating case differences
    pub fn entry_name(&self, name: &str) -> Option<String> {
        if self.zip.index_for_name(name).is_some() {
            return Some(name.to_string());
        }
        self.folded_names.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry_name(name).is_some()
    }

    /// Entry names, in archive order
    pub fn names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_string).collect()
    }

    /// Read an entry, or `None` if the archive has no such entry
    pub fn read_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContainerError> {
        self.check_deadline()?;
        let Some(actual) = self.entry_name(name) else {
            return Ok(None);
        };

        let max_entry = self.limits.max_entry_bytes;
        let mut entry = self
            .zip
            .by_name(&actual)
            .map_err(|e| ContainerError::MalformedContainer(format!("{}: {}", actual, e)))?;

        if entry.size() > max_entry {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "entry '{}' declares {} bytes, limit is {}",
                actual,
                entry.size(),
                max_entry
            )));
        }

        // Declared sizes can lie; cap the actual read as well.
        let mut data = Vec::new();
        (&mut entry)
            .take(max_entry + 1)
            .read_to_end(&mut data)
            .map_err(|e| ContainerError::MalformedContainer(format!("{}: {}", actual, e)))?;
        if data.len() as u64 > max_entry {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "entry '{}' exceeds {} bytes",
                actual, max_entry
            )));
        }

        self.bytes_read += data.len() as u64;
        if self.bytes_read > self.limits.max_total_bytes {
            return Err(ContainerError::ResourceLimitExceeded(format!(
                "container expands beyond {} bytes",
                self.limits.max_total_bytes
            )));
        }

        Ok(Some(data))
    }
}
