//! Persistent metadata store for hosted images.
//!
//! This module keeps the local knowledge about every image in the account:
//! the remote metadata first seen for it and the content hash computed once
//! its file is on disk.
//!
//! # Architecture
//!
//! * [`record`]: The [`ImageRecord`] model and the id-indexed [`RecordSet`].
//! * [`io`]: [`MetadataStore`], which loads and saves the record collection
//!   as a single JSON file.
//!
//! # Merge Semantics
//!
//! Records are only ever appended. A record already present for an id is
//! never replaced by later remote data, and a computed hash is never
//! recomputed.

pub mod io;
pub mod record;

use std::path::PathBuf;

pub use io::MetadataStore;
pub use record::{ImageRecord, RecordSet};

/// Errors raised while reading or writing the metadata store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// An I/O error occurred while accessing the store file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The record collection could not be serialized.
    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),
}
