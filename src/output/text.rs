//! Human-readable duplicate report.
//!
//! Every duplicate pair is printed as a block, in collection order:
//!
//! ```text
//!   Duplicates found:
//!     a1B2c3d: 1970-01-01 00:16:40 UTC
//!     e4F5g6h: 1970-01-01 00:33:20 UTC
//! ```

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use yansi::Paint;

use crate::duplicates::DuplicateEntry;
use crate::pipeline::SyncReport;

/// Format an upload time the way the report prints it.
#[must_use]
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Text formatter for a [`SyncReport`].
pub struct TextOutput<'a> {
    report: &'a SyncReport,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter. `color` enables ANSI styling.
    #[must_use]
    pub fn new(report: &'a SyncReport, color: bool) -> Self {
        Self { report, color }
    }

    fn entry_line(&self, entry: &DuplicateEntry) -> String {
        let id = if self.color {
            entry.id.as_str().bold().to_string()
        } else {
            entry.id.clone()
        };
        format!("    {}: {}", id, format_timestamp(&entry.uploaded_at))
    }

    /// Write the pairs followed by a one-line summary.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let header = if self.color {
            "Duplicates found:".yellow().to_string()
        } else {
            "Duplicates found:".to_string()
        };
        for pair in &self.report.pairs {
            writeln!(writer, "  {header}")?;
            writeln!(writer, "{}", self.entry_line(&pair.first))?;
            writeln!(writer, "{}", self.entry_line(&pair.second))?;
        }
        writeln!(writer, "{}", self.summary_line())?;
        Ok(())
    }

    /// Summary of the run in one line.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let report = self.report;
        let mut parts = vec![
            format!("{} images", report.total_records),
            format!("{} hashed", report.hashed_records),
        ];
        if let Some(downloads) = &report.downloads {
            parts.push(format!(
                "{} downloaded ({})",
                downloads.downloaded,
                bytesize::ByteSize::b(downloads.bytes)
            ));
            if downloads.failed > 0 {
                parts.push(format!("{} downloads failed", downloads.failed));
            }
        }
        if let Some(catalog) = &report.catalog {
            if catalog.pages_failed > 0 {
                parts.push(format!("{} catalog pages failed", catalog.pages_failed));
            }
        }
        parts.push(format!(
            "{} duplicate pairs in {} groups",
            report.pairs.len(),
            report.groups.len()
        ));
        if report.interrupted {
            parts.push("interrupted".to_string());
        }
        parts.join(", ")
    }
}
