//! SSTable implementation
//!
//! Writes sorted record snapshots to disk and serves filtered point lookups
//! over them.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::bloom::BloomFilter;
use crate::error::{Result, StrataError};
use crate::memtable::Record;

use super::{parse_sequence, FIELD_SEPARATOR, FILTER_BITS_PER_RECORD, FILTER_HASH_COUNT};

/// An immutable sorted run on disk, paired with a membership filter over
/// its keys.
///
/// Once built, the file's content never changes; a run is retired only by
/// deleting the file and dropping it from the engine's run list. The filter
/// lives in memory only — [`load`](Self::load) rebuilds it from the record
/// lines.
pub struct SSTable {
    /// Path to the run file
    path: PathBuf,
    /// Creation sequence parsed from the file name; higher is newer
    sequence: u64,
    /// Filter over this run's key set
    bloom: BloomFilter,
}

impl SSTable {
    /// Write `records` (already sorted and deduplicated) to `path` and build
    /// the run's filter.
    pub fn build(path: impl Into<PathBuf>, records: &[Record]) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        for record in records {
            writeln!(writer, "{}{}{}", record.key, FIELD_SEPARATOR, record.value)?;
        }
        writer.flush()?;

        let mut bloom = Self::sized_filter(records.len())?;
        for record in records {
            bloom.add(&record.key);
        }

        let sequence = parse_sequence(&path).unwrap_or(0);
        Ok(Self {
            path,
            sequence,
            bloom,
        })
    }

    /// Open an existing run file and rebuild its filter.
    ///
    /// Two passes: the first counts records so the filter can be sized with
    /// the same formula as [`build`](Self::build), the second feeds every
    /// key into the fresh filter.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);

        let mut count = 0usize;
        for line in reader.by_ref().lines() {
            line?;
            count += 1;
        }

        let mut bloom = Self::sized_filter(count)?;
        reader.seek(SeekFrom::Start(0))?;
        for line in reader.lines() {
            let line = line?;
            let (key, _) = split_record(&line)?;
            bloom.add(key);
        }

        let sequence = parse_sequence(&path).unwrap_or(0);
        Ok(Self {
            path,
            sequence,
            bloom,
        })
    }

    /// Point lookup.
    ///
    /// Consults the filter first: a negative answer returns `Ok(None)`
    /// without touching disk. A positive answer linearly scans the file for
    /// the first exact key match — the filter is a pure optimization, and a
    /// false positive just costs one scan.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.bloom.contains(key) {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        for line in reader.lines() {
            let line = line?;
            let (record_key, value) = split_record(&line)?;
            if record_key == key {
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }

    /// Read every record in file order. Used by compaction merging.
    pub fn records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let (key, value) = split_record(&line)?;
            records.push(Record::new(key, value));
        }
        Ok(records)
    }

    /// Current on-disk size, probed live; 0 if the file cannot be stat'd.
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Path to the run file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creation sequence; higher is newer.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The run's membership filter.
    pub fn filter(&self) -> &BloomFilter {
        &self.bloom
    }

    /// Filter sized for `record_count` keys: 8n + 1 bits, 3 hashes.
    fn sized_filter(record_count: usize) -> Result<BloomFilter> {
        BloomFilter::new(
            FILTER_BITS_PER_RECORD * record_count + 1,
            FILTER_HASH_COUNT,
        )
    }
}

/// Split a record line at the reserved separator.
fn split_record(line: &str) -> Result<(&str, &str)> {
    line.split_once(FIELD_SEPARATOR).ok_or_else(|| {
        StrataError::Corruption(format!("record line has no field separator: {line:?}"))
    })
}
