//! Plugin list persistence.
//!
//! The store only sees an ordered list of records. Every save replaces the
//! whole file through a temporary file in the same directory followed by an
//! atomic rename, so a crash leaves either the old list or the new one.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::registry::PluginRecord;
use crate::config::PersistenceConfig;

/// Current on-disk format version.
const STORE_VERSION: u32 = 1;

/// Errors raised by a plugin store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access plugin store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Injected failure (in-memory store).
    #[error("Simulated write failure")]
    Simulated,
}

/// External store of the ordered plugin list.
pub trait PluginStore: Send {
    /// Load the stored list. `None` means nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list exists but cannot be read.
    fn load(&self) -> Result<Option<Vec<PluginRecord>>, StoreError>;

    /// Replace the stored list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list could not be written. The previous list
    /// must still be intact in that case.
    fn save(&mut self, records: &[PluginRecord]) -> Result<(), StoreError>;
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    plugins: Vec<PluginRecord>,
}

/// JSON file store with atomic replace-on-write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PluginStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<PluginRecord>>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let stored: StoreFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if stored.version != STORE_VERSION {
            tracing::warn!(version = stored.version, "unexpected plugin store version");
        }
        Ok(Some(stored.plugins))
    }

    fn save(&mut self, records: &[PluginRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| self.io_error(err))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|err| self.io_error(err))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let contents = StoreFile {
                version: STORE_VERSION,
                plugins: records.to_vec(),
            };
            serde_json::to_writer_pretty(&mut writer, &contents).map_err(|source| {
                StoreError::Corrupt {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer.write_all(b"\n").map_err(|err| self.io_error(err))?;
            writer.flush().map_err(|err| self.io_error(err))?;
        }
        tmp.as_file().sync_all().map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path).map_err(|err| self.io_error(err.error))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "plugin list saved");
        Ok(())
    }
}

/// Open the store named by the persistence settings.
///
/// Without a resolvable path the list lives in memory for this run only.
#[must_use]
pub fn open_store(config: &PersistenceConfig) -> Box<dyn PluginStore> {
    match config.resolve_path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using plugin store");
            Box::new(JsonFileStore::new(path))
        }
        None => {
            tracing::warn!("no plugin store path available, changes will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

/// In-memory store with injectable write failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<Vec<PluginRecord>>,
    saves: usize,
    fail_writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Start with a stored list.
    #[must_use]
    pub fn with_records(records: Vec<PluginRecord>) -> Self {
        Self {
            saved: Some(records),
            ..Self::default()
        }
    }

    /// Make the next `count` saves fail.
    pub fn fail_next_writes(&mut self, count: usize) { self.fail_writes = count; }

    /// Last successfully saved list.
    #[must_use]
    pub fn saved(&self) -> Option<&[PluginRecord]> { self.saved.as_deref() }

    /// Number of successful saves.
    #[must_use]
    pub const fn save_count(&self) -> usize { self.saves }
}

impl PluginStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<PluginRecord>>, StoreError> { Ok(self.saved.clone()) }

    fn save(&mut self, records: &[PluginRecord]) -> Result<(), StoreError> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(StoreError::Simulated);
        }
        self.saved = Some(records.to_vec());
        self.saves += 1;
        Ok(())
    }
}
