//! Fixed-size bloom filter
//!
//! Bit array packed into u64 words, with k positions per key derived from a
//! single xxh3 hash family reseeded by index.

use xxhash_rust::xxh3::Xxh3;

use crate::error::{Result, StrataError};

/// A fixed-size bloom filter over string keys.
///
/// Guarantees no false negatives: every key passed to [`add`](Self::add)
/// will test positive in [`contains`](Self::contains) forever after. False
/// positives occur at a rate governed by the bit count, hash count, and the
/// number of keys added.
pub struct BloomFilter {
    /// Bit array, packed into u64 words
    bits: Vec<u64>,
    /// Total addressable bits (positions reduce modulo this)
    bit_count: usize,
    /// Number of positions derived per key
    hash_count: usize,
}

impl BloomFilter {
    /// Create an empty filter with `bit_count` bits and `hash_count` hash
    /// derivations per key.
    ///
    /// Fails with [`StrataError::InvalidConfig`] if either parameter is zero.
    pub fn new(bit_count: usize, hash_count: usize) -> Result<Self> {
        if bit_count == 0 {
            return Err(StrataError::InvalidConfig(
                "bloom filter bit count must be positive".to_string(),
            ));
        }
        if hash_count == 0 {
            return Err(StrataError::InvalidConfig(
                "bloom filter hash count must be positive".to_string(),
            ));
        }

        let words = (bit_count + 63) / 64;
        Ok(Self {
            bits: vec![0u64; words],
            bit_count,
            hash_count,
        })
    }

    /// Add a key to the filter. Permanent: there is no removal.
    pub fn add(&mut self, key: &str) {
        for i in 0..self.hash_count {
            let pos = self.position(key, i);
            self.set_bit(pos);
        }
    }

    /// Check whether a key MIGHT be in the set.
    /// `false` → definitely not present. `true` → possibly present.
    pub fn contains(&self, key: &str) -> bool {
        (0..self.hash_count).all(|i| self.check_bit(self.position(key, i)))
    }

    /// Total number of addressable bits.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Number of hash derivations per key.
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Number of bits currently set.
    pub fn set_bits(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Derive the i-th position for a key.
    ///
    /// One hash primitive yields `hash_count` pseudo-independent positions:
    /// the hasher is reseeded per index by feeding the index byte before the
    /// key bytes, then the 64-bit digest is reduced modulo the bit count.
    fn position(&self, key: &str, i: usize) -> usize {
        let mut hasher = Xxh3::new();
        hasher.update(&[i as u8]);
        hasher.update(key.as_bytes());
        (hasher.digest() % self.bit_count as u64) as usize
    }

    fn set_bit(&mut self, pos: usize) {
        self.bits[pos / 64] |= 1 << (pos % 64);
    }

    fn check_bit(&self, pos: usize) -> bool {
        (self.bits[pos / 64] >> (pos % 64)) & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basics() {
        let mut filter = BloomFilter::new(128, 3).unwrap();
        filter.add("hello");
        assert!(filter.contains("hello"));
        assert!(!filter.contains("world"));
    }

    #[test]
    fn test_rejects_zero_sizing() {
        assert!(BloomFilter::new(0, 3).is_err());
        assert!(BloomFilter::new(128, 0).is_err());
    }
}
