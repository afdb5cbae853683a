//! Counting bloom filter
//!
//! Replaces each bit with an 8-bit saturating counter so that keys can be
//! removed as well as added.

use xxhash_rust::xxh3::Xxh3;

use crate::error::{Result, StrataError};

/// A bloom filter that supports removal.
///
/// Each position holds a counter capped at 255; `add` increments and
/// `remove` decrements, and membership means every derived counter is
/// nonzero.
///
/// Removing a key that was never added is a caller contract violation:
/// shared counters may drop below what a colliding, still-present key
/// needs, producing false negatives for that key.
pub struct CountingBloomFilter {
    counters: Vec<u8>,
    hash_count: usize,
}

impl CountingBloomFilter {
    /// Create an empty counting filter with `counter_count` counters and
    /// `hash_count` hash derivations per key.
    ///
    /// Fails with [`StrataError::InvalidConfig`] if either parameter is zero.
    pub fn new(counter_count: usize, hash_count: usize) -> Result<Self> {
        if counter_count == 0 {
            return Err(StrataError::InvalidConfig(
                "counting filter counter count must be positive".to_string(),
            ));
        }
        if hash_count == 0 {
            return Err(StrataError::InvalidConfig(
                "counting filter hash count must be positive".to_string(),
            ));
        }

        Ok(Self {
            counters: vec![0u8; counter_count],
            hash_count,
        })
    }

    /// Increment the counters for a key. Saturates at 255.
    pub fn add(&mut self, key: &str) {
        for i in 0..self.hash_count {
            let pos = self.position(key, i);
            self.counters[pos] = self.counters[pos].saturating_add(1);
        }
    }

    /// Decrement the counters for a key. Floors at 0.
    ///
    /// Does not verify the key was ever added; see the type-level contract.
    pub fn remove(&mut self, key: &str) {
        for i in 0..self.hash_count {
            let pos = self.position(key, i);
            self.counters[pos] = self.counters[pos].saturating_sub(1);
        }
    }

    /// Check whether a key MIGHT be in the set: every derived counter is
    /// nonzero.
    pub fn contains(&self, key: &str) -> bool {
        (0..self.hash_count).all(|i| self.counters[self.position(key, i)] > 0)
    }

    /// Same reseeded-by-index derivation as [`BloomFilter`](super::BloomFilter),
    /// reduced modulo the counter count.
    fn position(&self, key: &str, i: usize) -> usize {
        let mut hasher = Xxh3::new();
        hasher.update(&[i as u8]);
        hasher.update(key.as_bytes());
        (hasher.digest() % self.counters.len() as u64) as usize
    }
}
