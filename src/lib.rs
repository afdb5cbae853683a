//! # StrataKV
//!
//! A write-optimized key-value storage engine built on the Log-Structured
//! Merge pattern:
//! - Writes buffer in an in-memory table and flush to immutable sorted runs
//! - Every run carries a bloom filter so misses rarely touch disk
//! - Pluggable compaction policies (size-tiered, leveled, time-based)
//!   decide when and which runs to merge
//!
//! ## Architecture Overview
//!
//! ```text
//!                  put                        get
//!                   │                          │
//! ┌─────────────────▼──────────────────────────▼─────────────────┐
//! │                         Engine                                │
//! │        (single logical writer, synchronous operations)        │
//! └─────────┬──────────────────────────────────────┬─────────────┘
//!           │                                      │
//!           ▼                                      ▼
//!    ┌─────────────┐  flush when full   ┌──────────────────────┐
//!    │  MemTable   │ ─────────────────▶ │  Sorted Runs (.sst)  │
//!    │  (HashMap)  │                    │  newest ──▶ oldest   │
//!    └─────────────┘                    │  bloom-filter gated  │
//!                                       └──────────┬───────────┘
//!                                                  │ merge
//!                                       ┌──────────▼───────────┐
//!                                       │  CompactionPolicy    │
//!                                       └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod bloom;
pub mod compaction;
pub mod memtable;
pub mod sstable;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use bloom::{BloomFilter, CountingBloomFilter, FilterStats, TunedBloomFilter};
pub use compaction::{CompactionPolicy, LeveledPolicy, SizeTieredPolicy, TimeBasedPolicy};
pub use config::Config;
pub use engine::{CompactionInfo, Engine, EngineStats};
pub use error::{Result, StrataError};
pub use memtable::{MemTable, Record};
pub use sstable::SSTable;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
