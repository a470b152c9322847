//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Hashing downloaded files whose record has no hash yet
//! - Finding duplicate pairs by exact hash equality
//! - Grouping duplicates per hash for reports

pub mod finder;
pub mod groups;

pub use finder::{hash_local_files, HashStats};
pub use groups::{
    find_duplicate_pairs, group_by_hash, DuplicateEntry, DuplicateGroup, DuplicatePair,
};
