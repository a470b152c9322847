//! Scanner module for the local content directory.
//!
//! This module provides functionality for:
//! - Listing downloaded image files
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use imgdupe::scanner::{list_content_files, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! for file in list_content_files(Path::new("images")).unwrap() {
//!     let hash = hasher.compute_file_hash(&file.path).unwrap();
//!     println!("{} {}", file.record_id, hash);
//! }
//! ```

pub mod hasher;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::content::PARTIAL_SUFFIX;

// Re-export main types
pub use hasher::{Hasher, BLOCK_SIZE};

/// A downloaded file in the content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    /// Path to the file
    pub path: PathBuf,
    /// Record id derived from the file name (everything before the first `.`)
    pub record_id: String,
    /// File size in bytes
    pub size: u64,
}

/// Record id a content file belongs to.
///
/// Image files are named `<id>.<ext>`, so the id is the part of the name
/// before the first dot.
#[must_use]
pub fn record_id_from_filename(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// In-flight `.part` downloads and dot-files are ignored. A missing
/// directory yields an empty list.
///
/// # Errors
///
/// Returns [`ScanError`] if `dir` exists but is not a readable directory.
pub fn list_content_files(dir: &Path) -> Result<Vec<ContentFile>, ScanError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(source) if source.kind() == std::io::ErrorKind::PermissionDenied => {
                    ScanError::PermissionDenied(path)
                }
                Some(source) => ScanError::Io { path, source },
                None => ScanError::NotADirectory(path),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name.ends_with(&format!(".{PARTIAL_SUFFIX}")) {
            log::trace!("Ignoring {}", entry.path().display());
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push(ContentFile {
            record_id: record_id_from_filename(&name).to_string(),
            path: entry.path().to_path_buf(),
            size,
        });
    }

    Ok(files)
}

/// Errors that can occur while listing the content directory.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
