//! Cache Store Module
//!
//! The cache facade: public SET/GET/DEL on top of the index, with TTL and
//! LRU enforcement at mutation sites and write-through AOF logging. Startup
//! composes durable state by loading the snapshot and then replaying the
//! AOF, both through a non-logging mutation path.
//!
//! Callers are expected to serialize access (the server wraps the store in a
//! lock and holds it for the full duration of every operation, GET included,
//! since GET can remove expired entries and updates recency).

use std::collections::HashMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::cache::{CacheEntry, CacheStats, Expiry, Index};
use crate::error::{CacheError, Result};
use crate::persist::{aof, snapshot, AofCommand, AofWriter, Snapshot};

// == Cache Store ==
/// Durable cache engine combining the in-memory index with AOF persistence.
#[derive(Debug)]
pub struct CacheStore {
    /// In-memory key-to-entry index
    index: Index,
    /// Append-only command log; `None` after close
    aof: Option<AofWriter>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of live keys (0 = unlimited)
    max_keys: usize,
}

impl CacheStore {
    // == Recovery ==
    /// Opens the store, restoring durable state.
    ///
    /// Loads the snapshot first (best-effort), replays the AOF on top of it,
    /// then opens the log for appending. Nothing is logged until the replay
    /// has finished, so recovery cannot feed back into the log.
    ///
    /// Fails only when the AOF itself cannot be opened or created.
    pub fn open(aof_path: &Path, snapshot_path: &Path, max_keys: usize) -> Result<Self> {
        let mut store = Self {
            index: Index::new(),
            aof: None,
            stats: CacheStats::new(),
            max_keys,
        };

        let now = Utc::now();
        if let Some(snapshot) = snapshot::load(snapshot_path) {
            let restored = store.restore_from_snapshot(snapshot, now);
            info!(
                "Loaded snapshot from {} ({} entries)",
                snapshot_path.display(),
                restored
            );
        }

        if let Some(reader) = aof::open_for_replay(aof_path)? {
            let replay_stats = aof::replay(reader, |command| {
                store.apply_command(command, Utc::now());
            });
            info!(
                "Replayed AOF from {} ({} applied, {} skipped)",
                aof_path.display(),
                replay_stats.applied,
                replay_stats.skipped
            );
        }

        store.aof = Some(AofWriter::open(aof_path)?);
        store.stats.set_total_entries(store.index.len());
        Ok(store)
    }

    /// Replaces the index with the snapshot contents, dropping entries whose
    /// expiry has already passed. Loaded keys count as just accessed; recency
    /// is not persisted.
    fn restore_from_snapshot(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> usize {
        let mut entries = HashMap::new();
        for entry in snapshot.entries {
            if entry.expires_at.is_expired(now) {
                continue;
            }
            entries.insert(
                entry.key,
                CacheEntry {
                    value: entry.value,
                    expires_at: entry.expires_at,
                    last_access: now,
                },
            );
        }
        let restored = entries.len();
        self.index.replace_all(entries);
        restored
    }

    /// Applies a replayed command through the non-logging mutation path.
    fn apply_command(&mut self, command: AofCommand, now: DateTime<Utc>) {
        match command {
            AofCommand::Set { key, value, ttl } => {
                if let Err(err) = self.apply_set(&key, &value, ttl, now) {
                    error!("Replay failed to apply SET {}: {}", key, err);
                }
            }
            AofCommand::Del { key } => {
                self.index.remove(&key);
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair. `ttl_seconds == 0` means no expiry.
    ///
    /// When the store is at capacity and `key` is new, the live entry with
    /// the oldest access time is evicted first; its DEL record is logged
    /// before the incoming SET so that replay never transiently exceeds
    /// capacity.
    pub fn set(&mut self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidInput("key cannot be empty".to_string()));
        }
        if value.is_empty() {
            return Err(CacheError::InvalidInput(
                "value cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let evicted = self.apply_set(key, value, ttl_seconds, now)?;

        if let Some(aof) = self.aof.as_mut() {
            if let Some(victim) = &evicted {
                aof.log_del(victim);
            }
            aof.log_set(key, value, ttl_seconds);
        }

        self.stats.set_total_entries(self.index.len());
        Ok(())
    }

    /// Shared mutation path for SET, used both live and during replay.
    ///
    /// Sweeps expired entries (so zombies never count against capacity),
    /// evicts the live LRU key under capacity pressure, and inserts the
    /// entry. Returns the evicted key, if any. Never writes to the AOF.
    fn apply_set(
        &mut self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let swept = self.index.sweep_expired(now);
        self.stats.record_expired(swept.len());

        let is_new = !self.index.has(key);
        let mut evicted = None;

        if self.max_keys > 0 && is_new && self.index.count_live(now) >= self.max_keys {
            match self.index.find_lru_live(now) {
                Some(victim) => {
                    self.index.remove(&victim);
                    self.stats.record_eviction();
                    evicted = Some(victim);
                }
                None => {
                    // count_live saw a live entry, so a candidate must exist
                    return Err(CacheError::Internal(
                        "capacity pressure with no live eviction candidate".to_string(),
                    ));
                }
            }
        }

        self.index.insert(
            key.to_string(),
            value.to_string(),
            Expiry::from_ttl(now, ttl_seconds),
            now,
        );
        Ok(evicted)
    }

    // == Get ==
    /// Retrieves a value by key, updating its recency.
    ///
    /// An expired entry is removed on the spot and reported as not found; no
    /// AOF record is written for lazy expiry, since replay reproduces it from
    /// the recorded TTL.
    pub fn get(&mut self, key: &str) -> Result<String> {
        let now = Utc::now();

        let entry = match self.index.get(key) {
            Some(entry) => entry,
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        if entry.is_expired(now) {
            self.index.remove(key);
            self.stats.record_expired(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.index.len());
            return Err(CacheError::NotFound(key.to_string()));
        }

        let value = entry.value.clone();
        self.index.touch(key, now);
        self.stats.record_hit();
        Ok(value)
    }

    // == Delete ==
    /// Removes a key. Deleting an absent key succeeds (idempotent).
    pub fn del(&mut self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidInput("key cannot be empty".to_string()));
        }

        self.index.remove(key);
        if let Some(aof) = self.aof.as_mut() {
            aof.log_del(key);
        }
        self.stats.set_total_entries(self.index.len());
        Ok(())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    ///
    /// Called by the background cleaner; expiry removals are never logged.
    pub fn cleanup_expired(&mut self) -> usize {
        let swept = self.index.sweep_expired(Utc::now());
        self.stats.record_expired(swept.len());
        self.stats.set_total_entries(self.index.len());
        swept.len()
    }

    // == Snapshot ==
    /// Writes a point-in-time snapshot to `path` and, on success, truncates
    /// the AOF. The caller holds the store lock for the whole sequence, so no
    /// command can slip between capture and truncation.
    ///
    /// If the snapshot fails the AOF is left untouched; it must remain a
    /// suffix of the durable history relative to the current snapshot.
    pub fn snapshot_and_clear(&mut self, path: &Path) -> io::Result<()> {
        let now = Utc::now();
        let entries = self.index.snapshot_entries(now);
        let document = Snapshot::new(entries, now);
        snapshot::save(&document, path)?;

        if let Some(aof) = self.aof.as_mut() {
            aof.truncate()?;
        }
        Ok(())
    }

    // == Close ==
    /// Flushes and syncs the AOF and releases the file handle.
    ///
    /// No operation is durable after close; background tasks must be stopped
    /// before calling this.
    pub fn close(&mut self) -> io::Result<()> {
        match self.aof.take() {
            Some(aof) => aof.close(),
            None => Ok(()),
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
