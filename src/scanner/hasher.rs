//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//! This module provides the `Hasher` struct for computing content hashes of
//! downloaded images. Files are read in fixed [`BLOCK_SIZE`] blocks so memory
//! use stays constant regardless of file size.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// Size of each read when streaming a file through the hasher (64 KiB).
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Streaming content hasher.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    _private: (),
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the lowercase hex BLAKE3 digest of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use imgdupe::scanner::Hasher;
    /// use std::path::Path;
    ///
    /// let hash = Hasher::new().compute_file_hash(Path::new("images/abc.png")).unwrap();
    /// assert_eq!(hash.len(), 64);
    /// ```
    pub fn compute_file_hash(&self, path: &Path) -> Result<String, HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; BLOCK_SIZE];

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}

fn map_io_error(path: &Path, source: std::io::Error) -> HashError {
    match source.kind() {
        ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}
