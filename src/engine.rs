//! Engine Module
//!
//! The coordinator that sequences the write buffer, sorted runs, and
//! compaction policy into a consistent read/write path.
//!
//! ## Responsibilities
//! - Route writes through the memtable and flush full memtables to runs
//! - Serve reads memtable-first, then runs newest to oldest behind filters
//! - Recover the run list and sequence numbering from a directory scan
//! - Drive policy compaction after flushes, and expose unconditional
//!   compaction on demand

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compaction::CompactionPolicy;
use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::memtable::{MemTable, Record};
use crate::sstable::{self, SSTable};

/// The main storage engine
///
/// ## Concurrency Model: Single Logical Writer
///
/// The engine is strictly single-threaded: no internal locking, no atomic
/// state transitions. Every mutating operation takes `&mut self`, and a
/// flush or compaction runs to completion inside the `put` that triggered
/// it. A caller that wants concurrent access must serialize every call
/// externally (one exclusive lock around the whole engine).
///
/// ## Durability
///
/// There is no write-ahead log: memtable contents are lost on an
/// uncontrolled process exit. Flushed runs are immutable and survive
/// restarts; [`open`](Self::open) recovers them from the data directory.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory buffer for recent writes
    memtable: MemTable,

    /// Sorted runs, ordered by creation sequence (oldest to newest)
    tables: Vec<SSTable>,

    /// Sequence assigned to the next run; recomputed from disk at open
    next_sequence: u64,

    /// Active compaction policy, if any
    policy: Option<Box<dyn CompactionPolicy>>,

    /// Usage statistics; enabled iff a policy was supplied at open
    stats: Option<EngineStats>,
}

impl Engine {
    /// Open or create an engine with the given config, without a compaction
    /// policy or statistics.
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Load every `.sst` run file, rebuilding its filter
    /// 3. Sort runs by creation sequence and resume numbering past the max
    pub fn open(config: Config) -> Result<Self> {
        Self::open_internal(config, None)
    }

    /// Open or create an engine with a compaction policy.
    ///
    /// Statistics tracking is enabled alongside the policy; the policy is
    /// consulted after every flush.
    pub fn open_with_policy(config: Config, policy: Box<dyn CompactionPolicy>) -> Result<Self> {
        Self::open_internal(config, Some(policy))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    fn open_internal(config: Config, policy: Option<Box<dyn CompactionPolicy>>) -> Result<Self> {
        if config.flush_threshold == 0 {
            return Err(StrataError::InvalidConfig(
                "flush threshold must be positive".to_string(),
            ));
        }

        fs::create_dir_all(&config.data_dir)?;

        let mut tables = Vec::new();
        for entry in fs::read_dir(&config.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_run = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == sstable::FILE_EXTENSION);
            if is_run {
                tables.push(SSTable::load(&path)?);
            }
        }

        // File names embed the creation sequence; sorting by it recovers
        // recency order
        tables.sort_by_key(SSTable::sequence);
        let next_sequence = tables.last().map(|t| t.sequence() + 1).unwrap_or(0);

        if !tables.is_empty() {
            info!(runs = tables.len(), next_sequence, "recovered existing runs");
        }

        let stats = policy.is_some().then(EngineStats::default);
        let memtable = MemTable::new(config.flush_threshold);

        Ok(Self {
            config,
            memtable,
            tables,
            next_sequence,
            policy,
            stats,
        })
    }

    /// Put a key-value pair.
    ///
    /// If the memtable reaches its threshold, it is flushed into a new run
    /// synchronously; with a policy configured, a triggered compaction also
    /// completes before this call returns.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if let Some(stats) = &mut self.stats {
            stats.writes += 1;
        }

        self.memtable.put(key, value);
        if self.memtable.is_full() {
            self.flush_memtable()?;

            let triggered = self
                .policy
                .as_deref()
                .is_some_and(|policy| policy.should_compact(&self.tables));
            if triggered {
                self.compact_with_policy()?;
            }
        }
        Ok(())
    }

    /// Get a value by key.
    ///
    /// Search order:
    /// 1. Memtable — always the most recent write, shadows any on-disk value
    /// 2. Runs newest to oldest; a run whose filter rules the key out is
    ///    skipped without disk I/O
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        if let Some(stats) = &mut self.stats {
            stats.reads += 1;
        }

        if let Some(value) = self.memtable.get(key) {
            let value = value.to_string();
            if let Some(stats) = &mut self.stats {
                stats.memtable_hits += 1;
            }
            return Ok(Some(value));
        }

        for table in self.tables.iter().rev() {
            if !table.filter().contains(key) {
                if let Some(stats) = &mut self.stats {
                    stats.bloom_filter_saves += 1;
                }
                continue;
            }

            if let Some(value) = table.get(key)? {
                if let Some(stats) = &mut self.stats {
                    stats.sstable_hits += 1;
                }
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Merge ALL runs into one, unconditionally.
    ///
    /// Runs are read in creation order into a map whose overwrite-on-insert
    /// semantics realize "newest value wins"; the deduplicated result is
    /// written as a single new run and every input file is deleted. No-op
    /// below 2 runs. The memtable is not flushed.
    pub fn compact(&mut self) -> Result<()> {
        if self.tables.len() < 2 {
            return Ok(());
        }

        if let Some(stats) = &mut self.stats {
            stats.compactions += 1;
        }

        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for table in &self.tables {
            for record in table.records()? {
                merged.insert(record.key, record.value);
            }
        }

        let records: Vec<Record> = merged
            .into_iter()
            .map(|(key, value)| Record { key, value })
            .collect();

        info!(
            runs = self.tables.len(),
            records = records.len(),
            "compacting all runs"
        );

        let path = self.run_path(self.next_sequence);
        let new_table = SSTable::build(path, &records)?;

        for old in &self.tables {
            fs::remove_file(old.path())?;
        }
        self.tables = vec![new_table];
        self.next_sequence += 1;
        Ok(())
    }

    /// Merge the subset of runs chosen by the active policy.
    ///
    /// No-op when no policy is configured, when the policy reports no need,
    /// or when it selects fewer than 2 runs. Selected runs are merged in
    /// creation order regardless of the order the policy returned them, so
    /// later-created runs still override earlier ones; unselected runs keep
    /// their files and positions.
    pub fn compact_with_policy(&mut self) -> Result<()> {
        let selected: HashSet<u64> = {
            let Some(policy) = self.policy.as_deref() else {
                return Ok(());
            };
            if !policy.should_compact(&self.tables) {
                return Ok(());
            }
            policy
                .select_runs(&self.tables)
                .iter()
                .map(|run| run.sequence())
                .collect()
        };

        if selected.len() < 2 {
            return Ok(());
        }

        if let Some(stats) = &mut self.stats {
            stats.compactions += 1;
        }

        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for table in self.selected_tables(&selected) {
            for record in table.records()? {
                merged.insert(record.key, record.value);
            }
        }

        let records: Vec<Record> = merged
            .into_iter()
            .map(|(key, value)| Record { key, value })
            .collect();

        info!(
            selected = selected.len(),
            total = self.tables.len(),
            records = records.len(),
            "compacting selected runs"
        );

        let path = self.run_path(self.next_sequence);
        let new_table = SSTable::build(path, &records)?;

        for table in self.selected_tables(&selected) {
            fs::remove_file(table.path())?;
        }
        self.tables.retain(|t| !selected.contains(&t.sequence()));
        self.tables.push(new_table);
        self.next_sequence += 1;
        Ok(())
    }

    /// Read-only snapshot of compaction readiness.
    pub fn compaction_info(&self) -> CompactionInfo {
        let total_size: u64 = self.tables.iter().map(SSTable::file_size).sum();

        match self.policy.as_deref() {
            None => CompactionInfo {
                policy: "Basic".to_string(),
                should_compact: self.tables.len() >= 2,
                run_count: self.tables.len(),
                total_size,
                selected_count: self.tables.len(),
            },
            Some(policy) => CompactionInfo {
                policy: policy.name().to_string(),
                should_compact: policy.should_compact(&self.tables),
                run_count: self.tables.len(),
                total_size,
                selected_count: policy.select_runs(&self.tables).len(),
            },
        }
    }

    /// Usage statistics, or `None` if the engine was opened without a
    /// policy (statistics disabled).
    pub fn stats(&self) -> Option<&EngineStats> {
        self.stats.as_ref()
    }

    /// Replace the active compaction policy.
    pub fn set_policy(&mut self, policy: Box<dyn CompactionPolicy>) {
        self.policy = Some(policy);
    }

    // =========================================================================
    // Accessors (for testing and diagnostics)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Number of sorted runs currently on disk
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of distinct keys buffered in the memtable
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Flush the memtable into a new run with the next sequence number.
    fn flush_memtable(&mut self) -> Result<()> {
        let records = self.memtable.flush();
        let path = self.run_path(self.next_sequence);

        debug!(
            path = %path.display(),
            records = records.len(),
            "flushing memtable"
        );

        let table = SSTable::build(path, &records)?;
        self.tables.push(table);
        self.next_sequence += 1;

        if let Some(stats) = &mut self.stats {
            stats.flushes += 1;
        }
        Ok(())
    }

    fn run_path(&self, sequence: u64) -> PathBuf {
        self.config.data_dir.join(sstable::run_file_name(sequence))
    }

    /// Tables whose sequence is in `selected`, in creation order.
    fn selected_tables<'a>(
        &'a self,
        selected: &'a HashSet<u64>,
    ) -> impl Iterator<Item = &'a SSTable> {
        self.tables
            .iter()
            .filter(move |t| selected.contains(&t.sequence()))
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Running usage counters, enabled when the engine is opened with a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Total `put` calls
    pub writes: u64,
    /// Total `get` calls
    pub reads: u64,
    /// Reads answered from the memtable
    pub memtable_hits: u64,
    /// Reads answered from a sorted run
    pub sstable_hits: u64,
    /// Run scans skipped because a filter ruled the key out
    pub bloom_filter_saves: u64,
    /// Memtable flushes performed
    pub flushes: u64,
    /// Compactions performed (basic or policy-driven)
    pub compactions: u64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hit_rate = if self.reads > 0 {
            (self.memtable_hits + self.sstable_hits) as f64 / self.reads as f64 * 100.0
        } else {
            0.0
        };
        let bloom_efficiency = if self.reads > 0 {
            self.bloom_filter_saves as f64 / self.reads as f64 * 100.0
        } else {
            0.0
        };

        writeln!(f, "Engine Statistics:")?;
        writeln!(f, "  Total Writes: {}", self.writes)?;
        writeln!(f, "  Total Reads: {}", self.reads)?;
        writeln!(f, "  Memtable Hits: {}", self.memtable_hits)?;
        writeln!(f, "  SSTable Hits: {}", self.sstable_hits)?;
        writeln!(f, "  Hit Rate: {hit_rate:.2}%")?;
        writeln!(
            f,
            "  Bloom Filter Saves: {} ({bloom_efficiency:.2}% efficiency)",
            self.bloom_filter_saves
        )?;
        writeln!(f, "  Total Flushes: {}", self.flushes)?;
        write!(f, "  Compactions: {}", self.compactions)
    }
}

// =============================================================================
// Compaction Info
// =============================================================================

/// Read-only snapshot of the engine's compaction state.
#[derive(Debug, Clone)]
pub struct CompactionInfo {
    /// Active policy name, or "Basic" when none is configured
    pub policy: String,
    /// Whether compaction is currently indicated
    pub should_compact: bool,
    /// Total sorted runs
    pub run_count: usize,
    /// Aggregate on-disk size of all runs, probed live
    pub total_size: u64,
    /// How many runs the policy would select right now
    pub selected_count: usize,
}

impl fmt::Display for CompactionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compaction Info:")?;
        writeln!(f, "  Policy: {}", self.policy)?;
        writeln!(f, "  Should Compact: {}", self.should_compact)?;
        writeln!(f, "  Total Runs: {}", self.run_count)?;
        writeln!(f, "  Total Size: {} bytes", self.total_size)?;
        write!(f, "  Selected for Compaction: {} runs", self.selected_count)
    }
}
