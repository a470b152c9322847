//! Loading and saving the metadata store file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::record::{ImageRecord, RecordSet};
use super::StoreError;

/// Suffix given to a store file that could not be parsed.
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// JSON-file backed store for [`ImageRecord`]s.
///
/// The file holds a single JSON array of records in collection order.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Create a store backed by `path`. Nothing is read until [`load`](Self::load).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted records.
    ///
    /// A missing file yields an empty set. A file that cannot be parsed is
    /// moved aside to `<file>.corrupt` and an empty set is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// if a corrupt file cannot be moved aside.
    pub fn load(&self) -> Result<RecordSet, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No metadata store at {}, starting empty", self.path.display());
                return Ok(RecordSet::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<Vec<ImageRecord>>(&content) {
            Ok(records) => {
                let set = RecordSet::from_records(records);
                log::debug!(
                    "Loaded {} records ({} hashed) from {}",
                    set.len(),
                    set.hashed_count(),
                    self.path.display()
                );
                Ok(set)
            }
            Err(e) => {
                let backup = self.corrupt_path();
                log::warn!(
                    "Metadata store {} is unreadable ({}); moving it to {} and starting empty",
                    self.path.display(),
                    e,
                    backup.display()
                );
                fs::rename(&self.path, &backup).map_err(|source| StoreError::Io {
                    path: backup,
                    source,
                })?;
                Ok(RecordSet::new())
            }
        }
    }

    /// Persist all records, replacing the previous file.
    ///
    /// The data is written to a sibling `.tmp` file first and then renamed
    /// over the store, so an interrupted save leaves the old file intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] or [`StoreError::Io`] on failure.
    pub fn save(&self, records: &RecordSet) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string(records.records()).map_err(StoreError::Serialize)?;

        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        with_suffix(&self.path, "tmp")
    }

    fn corrupt_path(&self) -> PathBuf {
        with_suffix(&self.path, CORRUPT_SUFFIX)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
