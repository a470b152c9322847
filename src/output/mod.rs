//! Output formatters for sync results.
//!
//! This module provides different output formats for a [`SyncReport`](crate::pipeline::SyncReport):
//! - Text for people reading the terminal
//! - JSON for automation and scripting
//! - CSV for spreadsheet import

pub mod csv;
pub mod json;
pub mod text;

// Re-export main types
pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::text::TextOutput;
