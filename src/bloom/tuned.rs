//! Auto-sized bloom filter with statistics
//!
//! Computes optimal sizing from an expected element count and a target
//! false-positive rate, then tracks actual inserts so the achieved rate can
//! be estimated at any point.

use std::fmt;

use crate::error::{Result, StrataError};

use super::BloomFilter;

/// Practical upper bound on hash derivations per key
const MAX_HASH_COUNT: usize = 10;

/// Smallest filter worth allocating
const MIN_BIT_COUNT: usize = 8;

/// A bloom filter sized for a workload.
///
/// Sizing follows the standard formulas:
///   m = -n * ln(p) / (ln 2)^2
///   k = (m / n) * ln 2
/// clamped to m >= 8 and 1 <= k <= 10.
pub struct TunedBloomFilter {
    inner: BloomFilter,
    expected_elements: usize,
    actual_elements: usize,
}

impl TunedBloomFilter {
    /// Create a filter sized for `expected_elements` keys at the given
    /// target false-positive rate.
    ///
    /// Fails with [`StrataError::InvalidConfig`] if `expected_elements` is
    /// zero or the rate is outside (0, 1).
    pub fn for_capacity(expected_elements: usize, target_fpr: f64) -> Result<Self> {
        if expected_elements == 0 {
            return Err(StrataError::InvalidConfig(
                "expected element count must be positive".to_string(),
            ));
        }
        if !(target_fpr > 0.0 && target_fpr < 1.0) {
            return Err(StrataError::InvalidConfig(format!(
                "false positive rate must be in (0, 1), got {target_fpr}"
            )));
        }

        let n = expected_elements as f64;
        let ln2 = std::f64::consts::LN_2;

        let m = (-n * target_fpr.ln() / (ln2 * ln2)).ceil() as usize;
        let bit_count = m.max(MIN_BIT_COUNT);

        let k = (bit_count as f64 / n * ln2).round() as usize;
        let hash_count = k.clamp(1, MAX_HASH_COUNT);

        Ok(Self {
            inner: BloomFilter::new(bit_count, hash_count)?,
            expected_elements,
            actual_elements: 0,
        })
    }

    /// Add a key, tracking the insert count.
    pub fn add(&mut self, key: &str) {
        self.inner.add(key);
        self.actual_elements += 1;
    }

    /// Check whether a key MIGHT be in the set.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    /// Snapshot the filter's current statistics.
    ///
    /// The estimated false-positive rate is `(1 - e^(-k*n/m))^k` for the
    /// actual element count n, not the expected one.
    pub fn stats(&self) -> FilterStats {
        let k = self.inner.hash_count() as f64;
        let n = self.actual_elements as f64;
        let m = self.inner.bit_count() as f64;

        let false_positive_rate = (1.0 - (-k * n / m).exp()).powf(k);

        let set_bits = self.inner.set_bits();
        let fill_ratio = set_bits as f64 / m;

        FilterStats {
            bit_count: self.inner.bit_count(),
            hash_count: self.inner.hash_count(),
            expected_elements: self.expected_elements,
            actual_elements: self.actual_elements,
            false_positive_rate,
            fill_ratio,
            set_bits,
        }
    }
}

/// Point-in-time statistics for a [`TunedBloomFilter`]
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStats {
    /// Total addressable bits
    pub bit_count: usize,
    /// Hash derivations per key
    pub hash_count: usize,
    /// Element count the filter was sized for
    pub expected_elements: usize,
    /// Elements actually inserted so far
    pub actual_elements: usize,
    /// Estimated current false-positive rate
    pub false_positive_rate: f64,
    /// Fraction of bits set
    pub fill_ratio: f64,
    /// Raw count of set bits
    pub set_bits: usize,
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bloom Filter Statistics:")?;
        writeln!(f, "  Size: {} bits", self.bit_count)?;
        writeln!(f, "  Hash Functions: {}", self.hash_count)?;
        writeln!(f, "  Expected Elements: {}", self.expected_elements)?;
        writeln!(f, "  Actual Elements: {}", self.actual_elements)?;
        writeln!(
            f,
            "  False Positive Rate: {:.4} ({:.2}%)",
            self.false_positive_rate,
            self.false_positive_rate * 100.0
        )?;
        writeln!(
            f,
            "  Fill Ratio: {:.4} ({:.2}%)",
            self.fill_ratio,
            self.fill_ratio * 100.0
        )?;
        write!(f, "  Set Bits: {}/{}", self.set_bits, self.bit_count)
    }
}
