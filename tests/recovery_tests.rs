//! Crash Recovery Integration Tests
//!
//! End-to-end persistence scenarios: each test writes through a store, drops
//! it to simulate a crash, reopens from the same files and verifies the
//! recovered state.

use std::fs;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use duracache::cache::CacheStore;
use tempfile::{tempdir, TempDir};

fn test_paths() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let aof = dir.path().join("appendonly.aof");
    let snapshot = dir.path().join("dump.rdb");
    (dir, aof, snapshot)
}

fn aof_ops(path: &PathBuf) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap();
    content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            format!(
                "{} {}",
                value["op"].as_str().unwrap(),
                value["key"].as_str().unwrap()
            )
        })
        .collect()
}

#[test]
fn test_basic_round_trip() {
    let (_dir, aof, snapshot) = test_paths();
    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();

    store.set("user", "alice", 0).unwrap();
    assert_eq!(store.get("user").unwrap(), "alice");

    store.del("user").unwrap();
    assert!(store.get("user").is_err());
}

#[test]
fn test_ttl_expiry_writes_single_set_record() {
    let (_dir, aof, snapshot) = test_paths();
    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();

    store.set("s", "x", 1).unwrap();
    sleep(Duration::from_millis(1500));
    assert!(store.get("s").is_err());

    // Lazy expiry leaves no trace in the log
    assert_eq!(aof_ops(&aof), vec!["SET s"]);
}

#[test]
fn test_crash_recovery_via_aof() {
    let (_dir, aof, snapshot) = test_paths();

    // Phase 1: write data, then "crash" by dropping the store
    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();
        store.set("b", "2", 0).unwrap();
        store.del("a").unwrap();
    }

    // Phase 2: recover
    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert!(store.get("a").is_err());
    assert_eq!(store.get("b").unwrap(), "2");
}

#[test]
fn test_recovery_via_snapshot_plus_aof() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();

        // Snapshot subsumes the first SET and empties the log
        store.snapshot_and_clear(&snapshot).unwrap();
        assert_eq!(fs::metadata(&aof).unwrap().len(), 0);

        store.set("b", "2", 0).unwrap();
        store.del("a").unwrap();
        assert_eq!(aof_ops(&aof), vec!["SET b", "DEL a"]);
    }

    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert!(store.get("a").is_err());
    assert_eq!(store.get("b").unwrap(), "2");
}

#[test]
fn test_snapshot_then_truncate_preserves_recoverable_state() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();
        store.set("b", "2", 0).unwrap();
        store.del("a").unwrap();
        store.snapshot_and_clear(&snapshot).unwrap();
    }

    // Recovery from (snapshot, empty AOF) matches the pre-snapshot state
    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get("a").is_err());
    assert_eq!(store.get("b").unwrap(), "2");
}

#[test]
fn test_lru_under_pressure_and_aof_order() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 2).unwrap();
        store.set("a", "1", 0).unwrap();
        store.set("b", "2", 0).unwrap();
        store.get("a").unwrap();
        store.set("c", "3", 0).unwrap();

        assert!(store.get("b").is_err(), "b should have been evicted");
        assert_eq!(aof_ops(&aof), vec!["SET a", "SET b", "DEL b", "SET c"]);
    }

    // Replay converges to the same capacity-bounded index
    let mut store = CacheStore::open(&aof, &snapshot, 2).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.get("a").is_ok());
    assert!(store.get("b").is_err());
    assert!(store.get("c").is_ok());
}

#[test]
fn test_fill_to_capacity_evicts_first_inserted() {
    let (_dir, aof, snapshot) = test_paths();
    let mut store = CacheStore::open(&aof, &snapshot, 3).unwrap();

    store.set("k1", "1", 0).unwrap();
    store.set("k2", "2", 0).unwrap();
    store.set("k3", "3", 0).unwrap();
    store.set("k4", "4", 0).unwrap();

    assert!(store.get("k1").is_err());
    assert!(store.get("k2").is_ok());
    assert!(store.get("k3").is_ok());
    assert!(store.get("k4").is_ok());
}

#[test]
fn test_corrupt_aof_tail_recovers_prior_records() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();
        store.set("b", "2", 0).unwrap();
    }

    // Simulate a crash mid-write: append a truncated record
    let mut content = fs::read_to_string(&aof).unwrap();
    content.push_str("{\"op\":\"SET\",\"key\":\"x\",\"val");
    fs::write(&aof, content).unwrap();

    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert_eq!(store.get("a").unwrap(), "1");
    assert_eq!(store.get("b").unwrap(), "2");
    assert!(store.get("x").is_err());

    // The store keeps running and the next SET appends cleanly
    store.set("c", "3", 0).unwrap();
    drop(store);

    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert_eq!(store.get("c").unwrap(), "3");
}

#[test]
fn test_corrupt_snapshot_falls_back_to_aof() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();
    }

    fs::write(&snapshot, "not a snapshot at all").unwrap();

    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert_eq!(store.get("a").unwrap(), "1");
}

#[test]
fn test_expired_entries_do_not_survive_recovery() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("short", "x", 1).unwrap();
        store.set("forever", "y", 0).unwrap();
    }

    sleep(Duration::from_millis(1500));

    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert!(store.get("short").is_err());
    assert_eq!(store.get("forever").unwrap(), "y");
}

#[test]
fn test_ttl_survives_snapshot_and_restart() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("short", "x", 1).unwrap();
        store.set("long", "y", 3600).unwrap();
        store.snapshot_and_clear(&snapshot).unwrap();
    }

    sleep(Duration::from_millis(1500));

    // The snapshot records absolute expiry instants, so the short-lived key
    // is dropped on load while the long-lived one keeps its deadline
    let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
    assert!(store.get("short").is_err());
    assert_eq!(store.get("long").unwrap(), "y");
}

#[test]
fn test_recovery_is_repeatable() {
    let (_dir, aof, snapshot) = test_paths();

    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        store.set("a", "1", 0).unwrap();
        store.set("b", "2", 0).unwrap();
    }

    // Opening without writing changes nothing; a second recovery sees the
    // same state
    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        assert_eq!(store.get("a").unwrap(), "1");
    }
    {
        let mut store = CacheStore::open(&aof, &snapshot, 0).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap(), "1");
        assert_eq!(store.get("b").unwrap(), "2");
    }
}
