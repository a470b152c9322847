//! CSV output formatter for duplicate groups.
//!
//! One row is generated for each record that belongs to a duplicate group.
//!
//! # Columns
//!
//! - `group_id`: 1-based number of the duplicate group
//! - `hash`: content hash shared by the group
//! - `id`: record id
//! - `link`: content URL
//! - `uploaded_at`: upload time (RFC 3339, UTC)

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    id: &'a str,
    link: &'a str,
    uploaded_at: String,
}

/// CSV formatter for duplicate groups.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a formatter for `groups`.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the header and one row per group member.
    ///
    /// # Errors
    ///
    /// Returns [`CsvOutputError`] if serialization or writing fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (i, group) in self.groups.iter().enumerate() {
            for entry in &group.entries {
                csv_writer.serialize(CsvRow {
                    group_id: i + 1,
                    hash: &group.hash,
                    id: &entry.id,
                    link: &entry.link,
                    uploaded_at: entry.uploaded_at.to_rfc3339(),
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns [`CsvOutputError`] if serialization fails.
    pub fn to_csv_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::group_by_hash;
    use crate::store::{ImageRecord, RecordSet};

    #[test]
    fn test_csv_rows() {
        let mut records = Vec::new();
        for (id, hash) in [("a", "h1"), ("b", "h2"), ("c", "h1"), ("d", "h2"), ("e", "h1")] {
            let mut r = ImageRecord::new(id, format!("https://i.example/{id}.png"), 0);
            r.set_hash(hash);
            records.push(r);
        }
        let groups = group_by_hash(&RecordSet::from_records(records));
        let csv = CsvOutput::new(&groups).to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "group_id,hash,id,link,uploaded_at");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("1,h1,a,https://i.example/a.png,1970-01-01T00:00:00"));
        assert!(lines[4].starts_with("2,h2,b,"));
    }

    #[test]
    fn test_csv_empty_groups_writes_nothing() {
        let csv = CsvOutput::new(&[]).to_csv_string().unwrap();
        assert!(csv.is_empty());
    }
}
