//! Duplicate pairs and groups keyed on content hash.
//!
//! # Overview
//!
//! Two records are duplicates when both carry a content hash and the hashes
//! are equal. Records without a hash never match anything, including each
//! other.
//!
//! Records are bucketed by hash, so detection is linear in the number of
//! records; the pairs are then ordered by collection index so the result is
//! identical to comparing every `(i, j)` with `i < j`.
//!
//! # Example
//!
//! ```
//! use imgdupe::duplicates::find_duplicate_pairs;
//! use imgdupe::store::{ImageRecord, RecordSet};
//!
//! let mut a = ImageRecord::new("a", "https://i.example/a.png", 1000);
//! let mut b = ImageRecord::new("b", "https://i.example/b.png", 2000);
//! a.set_hash("same");
//! b.set_hash("same");
//! let records = RecordSet::from_records(vec![a, b, ImageRecord::new("c", "", 0)]);
//!
//! let pairs = find_duplicate_pairs(&records);
//! assert_eq!(pairs.len(), 1);
//! assert_eq!(pairs[0].first.id, "a");
//! assert_eq!(pairs[0].second.id, "b");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::{ImageRecord, RecordSet};

/// One side of a duplicate pair or one member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    /// Position of the record in the collection
    pub index: usize,
    /// Record id
    pub id: String,
    /// Content link
    pub link: String,
    /// Upload time
    pub uploaded_at: DateTime<Utc>,
}

impl DuplicateEntry {
    fn from_record(index: usize, record: &ImageRecord) -> Self {
        Self {
            index,
            id: record.id.clone(),
            link: record.link.clone(),
            uploaded_at: record.uploaded_at(),
        }
    }
}

/// Two records with identical content. `first` precedes `second` in the
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    /// Shared content hash
    pub hash: String,
    /// Earlier record in collection order
    pub first: DuplicateEntry,
    /// Later record in collection order
    pub second: DuplicateEntry,
}

/// All records sharing one content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared content hash
    pub hash: String,
    /// Members in collection order (always two or more)
    pub entries: Vec<DuplicateEntry>,
}

impl DuplicateGroup {
    /// Number of records in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of redundant uploads (all copies minus one).
    #[must_use]
    pub fn redundant(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Every pairwise match in this group, in collection order.
    #[must_use]
    pub fn pairs(&self) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();
        for (i, first) in self.entries.iter().enumerate() {
            for second in &self.entries[i + 1..] {
                pairs.push(DuplicatePair {
                    hash: self.hash.clone(),
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }
        pairs
    }
}

/// Bucket record indices by hash, skipping records without one.
///
/// Buckets keep collection order internally; the returned list is ordered by
/// each bucket's first index.
fn hash_buckets(records: &RecordSet) -> Vec<(&str, Vec<usize>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(hash) = record.hash() else {
            continue;
        };
        buckets
            .entry(hash)
            .or_insert_with(|| {
                order.push(hash);
                Vec::new()
            })
            .push(index);
    }

    order
        .into_iter()
        .filter_map(|hash| buckets.remove(hash).map(|indices| (hash, indices)))
        .collect()
}

/// Group records by hash, keeping only hashes shared by two or more records.
#[must_use]
pub fn group_by_hash(records: &RecordSet) -> Vec<DuplicateGroup> {
    let all = records.records();
    hash_buckets(records)
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(hash, indices)| DuplicateGroup {
            hash: hash.to_string(),
            entries: indices
                .into_iter()
                .map(|i| DuplicateEntry::from_record(i, &all[i]))
                .collect(),
        })
        .collect()
}

/// Every duplicate pair `(i, j)` with `i < j`, ordered by `(i, j)`.
///
/// A group of `n` identical uploads yields `n * (n - 1) / 2` pairs.
#[must_use]
pub fn find_duplicate_pairs(records: &RecordSet) -> Vec<DuplicatePair> {
    let mut pairs: Vec<DuplicatePair> = group_by_hash(records)
        .iter()
        .flat_map(DuplicateGroup::pairs)
        .collect();
    pairs.sort_by_key(|p| (p.first.index, p.second.index));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, datetime: i64, hash: Option<&str>) -> ImageRecord {
        let mut r = ImageRecord::new(id, format!("https://i.example/{id}.png"), datetime);
        if let Some(h) = hash {
            r.set_hash(h);
        }
        r
    }

    /// Reference all-pairs comparison.
    fn naive_pairs(records: &RecordSet) -> Vec<(usize, usize)> {
        let all = records.records();
        let mut out = Vec::new();
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                if let (Some(a), Some(b)) = (all[i].hash(), all[j].hash()) {
                    if a == b {
                        out.push((i, j));
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_single_pair_with_timestamps() {
        let records = RecordSet::from_records(vec![
            record("a", 1000, Some("h1")),
            record("b", 2000, Some("h1")),
        ]);
        let pairs = find_duplicate_pairs(&records);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first.id, "a");
        assert_eq!(pairs[0].second.id, "b");
        assert_eq!(pairs[0].first.uploaded_at.timestamp(), 1000);
        assert_eq!(pairs[0].second.uploaded_at.timestamp(), 2000);
    }

    #[test]
    fn test_missing_hashes_never_match() {
        let records = RecordSet::from_records(vec![
            record("a", 0, None),
            record("b", 0, None),
            record("c", 0, Some("x")),
        ]);
        assert!(find_duplicate_pairs(&records).is_empty());
        assert!(group_by_hash(&records).is_empty());
    }

    #[test]
    fn test_collection_order_not_time_order() {
        let records = RecordSet::from_records(vec![
            record("late", 9000, Some("h")),
            record("early", 10, Some("h")),
        ]);
        let pairs = find_duplicate_pairs(&records);
        assert_eq!(pairs[0].first.id, "late");
        assert_eq!(pairs[0].second.id, "early");
    }

    #[test]
    fn test_three_way_duplicate_yields_all_pairs() {
        let records = RecordSet::from_records(vec![
            record("a", 1, Some("h")),
            record("x", 1, Some("other")),
            record("b", 2, Some("h")),
            record("c", 3, Some("h")),
        ]);
        let pairs = find_duplicate_pairs(&records);
        let ids: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.first.id.as_str(), p.second.id.as_str()))
            .collect();
        assert_eq!(ids, vec![("a", "b"), ("a", "c"), ("b", "c")]);

        let groups = group_by_hash(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0].redundant(), 2);
    }

    #[test]
    fn test_interleaved_groups_sorted_like_all_pairs() {
        let records = RecordSet::from_records(vec![
            record("a", 0, Some("h2")),
            record("b", 0, Some("h1")),
            record("c", 0, Some("h2")),
            record("d", 0, Some("h1")),
            record("e", 0, None),
            record("f", 0, Some("h2")),
        ]);
        let got: Vec<(usize, usize)> = find_duplicate_pairs(&records)
            .iter()
            .map(|p| (p.first.index, p.second.index))
            .collect();
        assert_eq!(got, naive_pairs(&records));
    }

    #[test]
    fn test_groups_ordered_by_first_member() {
        let records = RecordSet::from_records(vec![
            record("a", 0, Some("z")),
            record("b", 0, Some("y")),
            record("c", 0, Some("y")),
            record("d", 0, Some("z")),
        ]);
        let groups = group_by_hash(&records);
        assert_eq!(groups[0].hash, "z");
        assert_eq!(groups[1].hash, "y");
    }

    #[test]
    fn test_empty_records() {
        assert!(find_duplicate_pairs(&RecordSet::new()).is_empty());
    }
}
