//! Tests for the Engine coordinator
//!
//! These tests verify:
//! - Flush triggering and run creation
//! - Memtable shadowing and newest-run-wins reads
//! - Basic and policy-driven compaction
//! - Recovery from a directory scan (restart semantics)
//! - Statistics and compaction info

use stratakv::{Config, Engine, SizeTieredPolicy, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine(flush_threshold: usize) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_threshold(flush_threshold)
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

/// Engine with a size-tiered policy that fires as soon as two similarly
/// sized runs exist (statistics enabled)
fn setup_temp_engine_with_policy(flush_threshold: usize) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_threshold(flush_threshold)
        .build();
    let policy = SizeTieredPolicy {
        min_runs: 2,
        ..SizeTieredPolicy::default()
    };
    let engine = Engine::open_with_policy(config, Box::new(policy)).unwrap();
    (temp_dir, engine)
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let config = Config::builder().data_dir(&data_dir).build();
    let _engine = Engine::open(config).unwrap();

    assert!(data_dir.exists());
}

#[test]
fn test_open_rejects_zero_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_threshold(0)
        .build();

    assert!(matches!(
        Engine::open(config),
        Err(StrataError::InvalidConfig(_))
    ));
}

#[test]
fn test_put_get_roundtrip() {
    let (_temp, mut engine) = setup_temp_engine(100);

    engine.put("alpha", "1").unwrap();
    engine.put("beta", "2").unwrap();

    assert_eq!(engine.get("alpha").unwrap(), Some("1".to_string()));
    assert_eq!(engine.get("beta").unwrap(), Some("2".to_string()));
    assert_eq!(engine.get("gamma").unwrap(), None);
}

#[test]
fn test_put_triggers_flush_at_threshold() {
    let (_temp, mut engine) = setup_temp_engine(3);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap();
    assert_eq!(engine.table_count(), 0);

    engine.put("c", "3").unwrap();
    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.memtable_len(), 0);

    // Flushed data remains readable from the run
    assert_eq!(engine.get("a").unwrap(), Some("1".to_string()));
}

// =============================================================================
// Shadowing & Recency
// =============================================================================

#[test]
fn test_memtable_shadows_flushed_value() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("key", "disk").unwrap();
    engine.put("other", "x").unwrap(); // flush
    assert_eq!(engine.table_count(), 1);

    engine.put("key", "buffered").unwrap();
    assert_eq!(engine.get("key").unwrap(), Some("buffered".to_string()));
}

#[test]
fn test_newer_run_wins() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("key", "old").unwrap();
    engine.put("pad1", "x").unwrap(); // flush run 0
    engine.put("key", "new").unwrap();
    engine.put("pad2", "x").unwrap(); // flush run 1
    assert_eq!(engine.table_count(), 2);
    assert_eq!(engine.memtable_len(), 0);

    assert_eq!(engine.get("key").unwrap(), Some("new".to_string()));
}

// =============================================================================
// Basic Compaction
// =============================================================================

#[test]
fn test_compact_is_noop_below_two_runs() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap(); // flush
    assert_eq!(engine.table_count(), 1);

    engine.compact().unwrap();
    assert_eq!(engine.table_count(), 1);
}

#[test]
fn test_compact_merges_to_single_run_keeping_latest_values() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("key", "v1").unwrap();
    engine.put("stable", "s").unwrap(); // flush run 0
    engine.put("key", "v2").unwrap();
    engine.put("extra", "e").unwrap(); // flush run 1
    assert_eq!(engine.table_count(), 2);

    engine.compact().unwrap();

    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.get("key").unwrap(), Some("v2".to_string()));
    assert_eq!(engine.get("stable").unwrap(), Some("s".to_string()));
    assert_eq!(engine.get("extra").unwrap(), Some("e".to_string()));
}

#[test]
fn test_end_to_end_flush_shadow_compact() {
    let (_temp, mut engine) = setup_temp_engine(3);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap();
    engine.put("c", "3").unwrap(); // flush
    assert_eq!(engine.table_count(), 1);

    engine.put("a", "9").unwrap();
    assert_eq!(engine.memtable_len(), 1);
    assert_eq!(engine.table_count(), 1);

    // Buffered write shadows the on-disk "1"
    assert_eq!(engine.get("a").unwrap(), Some("9".to_string()));

    // Compact does not flush the buffer, so only 1 run exists: no-op
    engine.compact().unwrap();
    assert_eq!(engine.table_count(), 1);

    engine.put("d", "4").unwrap();
    engine.put("e", "5").unwrap(); // flush: buffer held a, d, e
    assert_eq!(engine.table_count(), 2);

    engine.compact().unwrap();
    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.get("a").unwrap(), Some("9".to_string()));
}

// =============================================================================
// Policy Compaction
// =============================================================================

#[test]
fn test_policy_compaction_runs_after_flush() {
    let (_temp, mut engine) = setup_temp_engine_with_policy(2);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap(); // flush run 0
    assert_eq!(engine.table_count(), 1);

    engine.put("c", "3").unwrap();
    engine.put("d", "4").unwrap(); // flush run 1, then the policy fires

    assert_eq!(engine.table_count(), 1);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.flushes, 2);
    assert_eq!(stats.compactions, 1);

    for (key, value) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
        assert_eq!(engine.get(key).unwrap(), Some(value.to_string()));
    }
}

#[test]
fn test_compact_with_policy_is_noop_without_policy() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap(); // flush
    engine.put("c", "3").unwrap();
    engine.put("d", "4").unwrap(); // flush
    assert_eq!(engine.table_count(), 2);

    engine.compact_with_policy().unwrap();
    assert_eq!(engine.table_count(), 2);
}

#[test]
fn test_set_policy_enables_policy_compaction() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap(); // flush
    engine.put("c", "3").unwrap();
    engine.put("d", "4").unwrap(); // flush
    assert_eq!(engine.table_count(), 2);

    engine.set_policy(Box::new(SizeTieredPolicy {
        min_runs: 2,
        ..SizeTieredPolicy::default()
    }));
    engine.compact_with_policy().unwrap();

    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.get("a").unwrap(), Some("1".to_string()));
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_reopen_recovers_flushed_data() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_threshold(2)
        .build();

    {
        let mut engine = Engine::open(config.clone()).unwrap();
        engine.put("k1", "v1").unwrap();
        engine.put("k2", "v2").unwrap(); // flush run 0
        engine.put("k3", "v3").unwrap();
        engine.put("k4", "v4").unwrap(); // flush run 1
        engine.put("k5", "unflushed").unwrap(); // stays in the buffer
    }

    let mut engine = Engine::open(config).unwrap();
    assert_eq!(engine.table_count(), 2);

    for (key, value) in [("k1", "v1"), ("k2", "v2"), ("k3", "v3"), ("k4", "v4")] {
        assert_eq!(engine.get(key).unwrap(), Some(value.to_string()));
    }

    // Buffered data died with the previous instance (no write-ahead log)
    assert_eq!(engine.get("k5").unwrap(), None);
}

#[test]
fn test_sequence_numbering_survives_restart_and_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_threshold(2)
        .build();

    {
        let mut engine = Engine::open(config.clone()).unwrap();
        engine.put("a", "1").unwrap();
        engine.put("b", "2").unwrap(); // run 0
        engine.put("c", "3").unwrap();
        engine.put("d", "4").unwrap(); // run 1
        engine.compact().unwrap(); // runs 0+1 -> run 2
        assert_eq!(engine.table_count(), 1);
    }

    let mut engine = Engine::open(config).unwrap();
    assert_eq!(engine.table_count(), 1);

    // A new flush must not collide with the surviving run's file
    engine.put("e", "5").unwrap();
    engine.put("f", "6").unwrap(); // run 3
    assert_eq!(engine.table_count(), 2);

    for (key, value) in [("a", "1"), ("d", "4"), ("e", "5")] {
        assert_eq!(engine.get(key).unwrap(), Some(value.to_string()));
    }
}

// =============================================================================
// Statistics & Compaction Info
// =============================================================================

#[test]
fn test_stats_disabled_without_policy() {
    let (_temp, mut engine) = setup_temp_engine(10);
    engine.put("a", "1").unwrap();

    assert!(engine.stats().is_none());
}

#[test]
fn test_stats_track_reads_and_writes() {
    let (_temp, mut engine) = setup_temp_engine_with_policy(100);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap();
    engine.get("a").unwrap();
    engine.get("missing").unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.memtable_hits, 1);
    assert_eq!(stats.flushes, 0);
}

#[test]
fn test_stats_display() {
    let (_temp, mut engine) = setup_temp_engine_with_policy(100);
    engine.put("a", "1").unwrap();
    engine.get("a").unwrap();

    let rendered = engine.stats().unwrap().to_string();
    assert!(rendered.contains("Engine Statistics"));
    assert!(rendered.contains("Hit Rate: 100.00%"));
}

#[test]
fn test_compaction_info_without_policy() {
    let (_temp, mut engine) = setup_temp_engine(2);

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap(); // flush
    engine.put("c", "3").unwrap();
    engine.put("d", "4").unwrap(); // flush

    let info = engine.compaction_info();
    assert_eq!(info.policy, "Basic");
    assert!(info.should_compact);
    assert_eq!(info.run_count, 2);
    assert_eq!(info.selected_count, 2);
    assert!(info.total_size > 0);
}

#[test]
fn test_compaction_info_reports_policy_name() {
    let (_temp, engine) = setup_temp_engine_with_policy(100);

    let info = engine.compaction_info();
    assert_eq!(info.policy, "Size-Tiered");
    assert_eq!(info.run_count, 0);
    assert!(!info.should_compact);
}
