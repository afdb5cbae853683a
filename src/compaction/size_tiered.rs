//! Size-tiered compaction
//!
//! Groups runs into tiers of similar file size and merges the most crowded
//! tier once it is large enough.

use crate::sstable::SSTable;

use super::CompactionPolicy;

/// Size-tiered compaction policy.
///
/// Runs are sorted by file size and split into contiguous tiers wherever
/// the size ratio between consecutive runs exceeds `size_ratio`. Compaction
/// triggers once some tier holds `min_runs` runs, or any single run
/// outgrows `max_run_size`.
pub struct SizeTieredPolicy {
    /// Minimum runs overall, and per tier, to trigger compaction
    pub min_runs: usize,
    /// Consecutive size ratio that starts a new tier
    pub size_ratio: f64,
    /// Single-run size that forces compaction
    pub max_run_size: u64,
}

impl Default for SizeTieredPolicy {
    fn default() -> Self {
        Self {
            min_runs: 4,
            size_ratio: 2.0,
            max_run_size: 1024 * 1024, // 1 MiB
        }
    }
}

impl SizeTieredPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group runs into tiers of similar size, smallest tier first.
    fn tiers<'a>(&self, runs: &'a [SSTable]) -> Vec<Vec<&'a SSTable>> {
        let mut sorted: Vec<&SSTable> = runs.iter().collect();
        sorted.sort_by_key(|run| run.file_size());

        let mut tiers: Vec<Vec<&SSTable>> = Vec::new();
        let mut current: Vec<&SSTable> = Vec::new();
        let mut last_size: u64 = 0;

        for run in sorted {
            let size = run.file_size();
            if last_size == 0 || size as f64 / last_size as f64 <= self.size_ratio {
                current.push(run);
            } else {
                if !current.is_empty() {
                    tiers.push(current);
                }
                current = vec![run];
            }
            last_size = size;
        }

        if !current.is_empty() {
            tiers.push(current);
        }

        tiers
    }
}

impl CompactionPolicy for SizeTieredPolicy {
    fn should_compact(&self, runs: &[SSTable]) -> bool {
        if runs.len() < self.min_runs {
            return false;
        }

        if self.tiers(runs).iter().any(|tier| tier.len() >= self.min_runs) {
            return true;
        }

        runs.iter().any(|run| run.file_size() > self.max_run_size)
    }

    fn select_runs<'a>(&self, runs: &'a [SSTable]) -> Vec<&'a SSTable> {
        // The tier with the most runs; earliest such tier on a size tie
        let mut best: Vec<&SSTable> = Vec::new();
        for tier in self.tiers(runs) {
            if tier.len() > best.len() {
                best = tier;
            }
        }
        best
    }

    fn name(&self) -> &str {
        "Size-Tiered"
    }
}
