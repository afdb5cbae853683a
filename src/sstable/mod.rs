//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted run of key-value records.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ one record per line, fields tab-separated               │
//! │   key \t value \n                                       │
//! │   ... repeated, keys sorted and unique ...              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! No escaping: a key or value containing a tab or newline is malformed by
//! contract. No index, footer, or filter block is persisted — the membership
//! filter is rebuilt from the record lines every time a run is loaded.
//!
//! ## File Naming
//! `run-{sequence:06}.sst`. The sequence number is assigned at creation and
//! establishes recency (higher = newer); zero-padding makes lexicographic
//! file-name order agree with numeric sequence order so a directory scan
//! recovers recency. Leveled compaction may tag a level into the name
//! (`run-L2-000042.sst`); the sequence is always the trailing segment.

mod table;

use std::path::Path;

pub use table::SSTable;

// =============================================================================
// Shared Constants
// =============================================================================

/// Extension identifying run files in a data directory
pub(crate) const FILE_EXTENSION: &str = "sst";

/// Field separator within a record line; reserved, never valid inside a key
pub(crate) const FIELD_SEPARATOR: char = '\t';

/// Filter sizing: bits allocated per record (bit count = 8n + 1)
pub(crate) const FILTER_BITS_PER_RECORD: usize = 8;

/// Filter sizing: hash derivations per key
pub(crate) const FILTER_HASH_COUNT: usize = 3;

// =============================================================================
// File Name Helpers
// =============================================================================

/// File name for a run created with the given sequence number
pub(crate) fn run_file_name(sequence: u64) -> String {
    format!("run-{sequence:06}.{FILE_EXTENSION}")
}

/// Parse the creation sequence out of a run file name.
///
/// The sequence is the trailing `-`-separated segment of the stem, so both
/// `run-000042.sst` and level-tagged names like `run-L2-000042.sst` parse.
pub(crate) fn parse_sequence(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence(&PathBuf::from("run-000042.sst")), Some(42));
        assert_eq!(parse_sequence(&PathBuf::from("run-L2-000007.sst")), Some(7));
        assert_eq!(parse_sequence(&PathBuf::from("notes.txt")), None);
    }

    #[test]
    fn test_file_name_orders_lexicographically() {
        assert!(run_file_name(2) < run_file_name(10));
    }
}
