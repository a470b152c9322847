//! Image metadata records and the ordered, id-indexed collection holding them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata for one hosted image.
///
/// Only `id`, `link`, `datetime` and `hash` are interpreted. Every other
/// field supplied by the remote API is kept in `extra` and written back
/// unchanged when the store is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable identifier assigned by the remote host.
    pub id: String,
    /// URL of the binary content.
    #[serde(default)]
    pub link: String,
    /// Upload time in seconds since the Unix epoch (UTC).
    #[serde(default)]
    pub datetime: i64,
    /// Content hash, `None` until computed locally.
    #[serde(
        default,
        deserialize_with = "deserialize_hash",
        skip_serializing_if = "Option::is_none"
    )]
    hash: Option<String>,
    /// Remote fields not interpreted by imgdupe.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Treats a missing, null or empty `hash` as "not computed yet".
fn deserialize_hash<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|h| !h.is_empty()))
}

impl ImageRecord {
    /// Create a record without a hash or extra fields.
    #[must_use]
    pub fn new(id: impl Into<String>, link: impl Into<String>, datetime: i64) -> Self {
        Self {
            id: id.into(),
            link: link.into(),
            datetime,
            hash: None,
            extra: serde_json::Map::new(),
        }
    }

    /// The content hash, if one has been computed.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Whether a content hash is present.
    #[must_use]
    pub fn has_hash(&self) -> bool {
        self.hash.is_some()
    }

    /// Store the content hash.
    ///
    /// A hash is written at most once. Returns `false` and leaves the record
    /// untouched when a hash is already present or `hash` is empty.
    pub fn set_hash(&mut self, hash: impl Into<String>) -> bool {
        let hash = hash.into();
        if self.hash.is_some() || hash.is_empty() {
            return false;
        }
        self.hash = Some(hash);
        true
    }

    /// Upload time as a UTC timestamp.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    #[must_use]
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.datetime, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Ordered collection of [`ImageRecord`]s with unique ids.
///
/// Records keep their insertion order; the id index only speeds up lookups
/// during catalog reconciliation.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<ImageRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from records, keeping the first occurrence of each id.
    #[must_use]
    pub fn from_records(records: Vec<ImageRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            if !set.insert_if_absent(record.clone()) {
                log::debug!("Dropping repeated record for id {}", record.id);
            }
        }
        set
    }

    /// Append `record` unless a record with the same id exists.
    ///
    /// Returns `true` if the record was added. Existing records are never
    /// replaced, so locally computed hashes survive reconciliation.
    pub fn insert_if_absent(&mut self, record: ImageRecord) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&ImageRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Look up a record by id for mutation.
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut ImageRecord> {
        match self.index.get(id) {
            Some(&i) => self.records.get_mut(i),
            None => None,
        }
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Iterate over records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that already carry a hash.
    #[must_use]
    pub fn hashed_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_hash()).count()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
