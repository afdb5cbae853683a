//! Membership Filter Module
//!
//! Probabilistic set-membership structures used to answer "is this key in
//! the set?" without touching disk.
//!
//! - If any probed bit is 0 → key is DEFINITELY NOT in the set
//! - If all probed bits are 1 → key is PROBABLY in the set (false positive possible)
//!
//! Every sorted run carries a filter over its own keys; on a miss-heavy
//! workload this skips the large majority of run-file scans.
//!
//! ## Variants
//! - [`BloomFilter`]: fixed bit count and hash count, chosen by the caller
//! - [`TunedBloomFilter`]: sized from an expected element count and a target
//!   false-positive rate, tracks inserts and reports statistics
//! - [`CountingBloomFilter`]: 8-bit saturating counters instead of bits,
//!   supports removal

mod counting;
mod filter;
mod tuned;

pub use counting::CountingBloomFilter;
pub use filter::BloomFilter;
pub use tuned::{FilterStats, TunedBloomFilter};
