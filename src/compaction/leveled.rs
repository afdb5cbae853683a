//! Leveled compaction
//!
//! Assigns each run a level from its file name and merges the first level
//! that exceeds its cap.

use std::collections::HashMap;
use std::path::Path;

use crate::sstable::SSTable;

use super::CompactionPolicy;

/// Leveled compaction policy.
///
/// A run's level is read from a `-L<n>-` marker in its file name; a name
/// without a marker is level 0. Level 0 holds freshly flushed runs with
/// overlapping key ranges and triggers on run count alone; levels >= 1
/// trigger when their aggregate byte size exceeds a per-level cap growing
/// geometrically past the explicit caps.
pub struct LeveledPolicy {
    /// Highest level considered during selection
    pub max_level: usize,
    /// Explicit byte caps for the first levels >= 1
    pub level_caps: Vec<u64>,
    /// Cap multiplier for each level past the explicit caps
    pub growth_factor: u64,
    /// Run count that triggers a level-0 compaction
    pub level0_run_limit: usize,
}

impl Default for LeveledPolicy {
    fn default() -> Self {
        Self {
            max_level: 7,
            level_caps: vec![10 * 1024, 100 * 1024, 1024 * 1024], // 10 KiB, 100 KiB, 1 MiB
            growth_factor: 10,
            level0_run_limit: 4,
        }
    }
}

impl LeveledPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_by_level<'a>(&self, runs: &'a [SSTable]) -> HashMap<usize, Vec<&'a SSTable>> {
        let mut levels: HashMap<usize, Vec<&SSTable>> = HashMap::new();
        for run in runs {
            levels.entry(run_level(run.path())).or_default().push(run);
        }
        levels
    }

    /// Byte cap for a level >= 1.
    fn level_cap(&self, level: usize) -> u64 {
        if let Some(&cap) = self.level_caps.get(level) {
            return cap;
        }

        let mut cap = self.level_caps.last().copied().unwrap_or(0);
        for _ in self.level_caps.len()..=level {
            cap *= self.growth_factor;
        }
        cap
    }

    fn level_triggers(&self, level: usize, runs: &[&SSTable]) -> bool {
        if level == 0 {
            // Level 0 runs may overlap and are never size-bounded
            runs.len() >= self.level0_run_limit
        } else {
            let total: u64 = runs.iter().map(|run| run.file_size()).sum();
            total > self.level_cap(level)
        }
    }
}

impl CompactionPolicy for LeveledPolicy {
    fn should_compact(&self, runs: &[SSTable]) -> bool {
        self.group_by_level(runs)
            .iter()
            .any(|(&level, level_runs)| self.level_triggers(level, level_runs))
    }

    fn select_runs<'a>(&self, runs: &'a [SSTable]) -> Vec<&'a SSTable> {
        let levels = self.group_by_level(runs);

        // Lowest triggering level wins
        for level in 0..=self.max_level {
            let Some(level_runs) = levels.get(&level) else {
                continue;
            };
            if self.level_triggers(level, level_runs) {
                return level_runs.clone();
            }
        }

        Vec::new()
    }

    fn name(&self) -> &str {
        "Leveled"
    }
}

/// Level marker parsed from a run file name; absence means level 0.
///
/// `run-L2-000042.sst` → 2, `run-000042.sst` → 0.
fn run_level(path: &Path) -> usize {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return 0;
    };

    stem.split('-')
        .find_map(|part| part.strip_prefix('L')?.parse().ok())
        .unwrap_or(0)
}
