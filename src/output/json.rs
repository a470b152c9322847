//! JSON output formatter for sync results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "af13...",
//!       "first": { "index": 0, "id": "a", "link": "https://...", "uploaded_at": "1970-01-01T00:16:40Z" },
//!       "second": { "index": 4, "id": "e", "link": "https://...", "uploaded_at": "1970-01-01T00:33:20Z" }
//!     }
//!   ],
//!   "groups": [ { "hash": "af13...", "entries": [ ... ] } ],
//!   "summary": { "total_records": 120, "hashed_records": 118, ... }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, DuplicatePair};
use crate::error::ExitCode;
use crate::pipeline::SyncReport;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Records in the store after the run
    pub total_records: usize,
    /// Records carrying a hash
    pub hashed_records: usize,
    /// Records added from the catalog in this run
    pub new_records: usize,
    /// Catalog pages that failed
    pub pages_failed: u64,
    /// Files downloaded in this run
    pub downloaded: usize,
    /// Downloads that failed
    pub download_failures: usize,
    /// Bytes downloaded
    pub downloaded_bytes: u64,
    /// Files hashed in this run
    pub hashed_now: usize,
    /// Number of duplicate pairs
    pub duplicate_pairs: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ID000")
    pub exit_code_name: String,
}

impl JsonSummary {
    fn from_report(report: &SyncReport) -> Self {
        let catalog = report.catalog.clone().unwrap_or_default();
        let downloads = report.downloads.clone().unwrap_or_default();
        let exit_code: ExitCode = report.exit_code();
        Self {
            total_records: report.total_records,
            hashed_records: report.hashed_records,
            new_records: catalog.new_records,
            pages_failed: catalog.pages_failed,
            downloaded: downloads.downloaded,
            download_failures: downloads.failed,
            downloaded_bytes: downloads.bytes,
            hashed_now: report.hashing.hashed,
            duplicate_pairs: report.pairs.len(),
            duplicate_groups: report.groups.len(),
            interrupted: report.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Duplicate pairs in collection order
    pub duplicates: &'a [DuplicatePair],
    /// Duplicate groups
    pub groups: &'a [DuplicateGroup],
    /// Run summary
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Create a JSON document for a report.
    #[must_use]
    pub fn new(report: &'a SyncReport) -> Self {
        Self {
            duplicates: &report.pairs,
            groups: &report.groups,
            summary: JsonSummary::from_report(report),
        }
    }

    /// Serialize with indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the pretty-printed document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let json = self.to_json_pretty().map_err(std::io::Error::other)?;
        writeln!(writer, "{json}")
    }
}
