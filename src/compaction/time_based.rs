//! Time-based compaction
//!
//! Merges runs once enough of them have sat on disk past a maximum age.

use std::fs;
use std::time::{Duration, SystemTime};

use crate::sstable::SSTable;

use super::CompactionPolicy;

/// Time-based compaction policy.
///
/// A run's age is `now - mtime` of its file. Compaction triggers once at
/// least `min_runs` runs are older than `max_age`; exactly those runs are
/// selected.
pub struct TimeBasedPolicy {
    /// Age past which a run becomes a compaction candidate
    pub max_age: Duration,
    /// Minimum number of old runs to trigger compaction
    pub min_runs: usize,
}

impl Default for TimeBasedPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(3600),
            min_runs: 3,
        }
    }
}

impl TimeBasedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run is older than the threshold. A run whose file cannot
    /// be stat'd is treated as not old.
    fn is_old(&self, run: &SSTable) -> bool {
        let Ok(modified) = fs::metadata(run.path()).and_then(|m| m.modified()) else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > self.max_age,
            Err(_) => false, // mtime in the future
        }
    }
}

impl CompactionPolicy for TimeBasedPolicy {
    fn should_compact(&self, runs: &[SSTable]) -> bool {
        if runs.len() < self.min_runs {
            return false;
        }

        let old = runs.iter().filter(|run| self.is_old(run)).count();
        old >= self.min_runs
    }

    fn select_runs<'a>(&self, runs: &'a [SSTable]) -> Vec<&'a SSTable> {
        runs.iter().filter(|run| self.is_old(run)).collect()
    }

    fn name(&self) -> &str {
        "Time-Based"
    }
}
