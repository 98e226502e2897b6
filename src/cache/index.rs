//! Index Module
//!
//! In-memory key-to-entry mapping with the primitives the cache facade uses
//! under its lock: expiry checks, live-key counting, LRU scanning and bulk
//! expiry sweeps. All methods assume the caller holds the facade lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, Expiry};

// == Index ==
/// Mapping from key to entry. Keys are unique; iteration order is unspecified.
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<String, CacheEntry>,
}

impl Index {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Checks whether a key is present (expired entries count until removed).
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns a reference to the entry for `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Checks whether the entry for `key` is expired at `now`.
    ///
    /// Absent keys and keys without expiry are not expired.
    pub fn is_expired(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Counts entries that are not expired at `now`.
    pub fn count_live(&self, now: DateTime<Utc>) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Inserts or replaces the entry for `key`, marking it just accessed.
    pub fn insert(&mut self, key: String, value: String, expires_at: Expiry, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                last_access: now,
            },
        );
    }

    /// Removes the entry for `key`. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Updates the entry's last access instant.
    pub fn touch(&mut self, key: &str, now: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = now;
        }
    }

    /// Finds the live key with the oldest last access at `now`.
    ///
    /// Expired entries are skipped so they cannot distort eviction order.
    /// Equal access instants are broken by key ordering, which keeps the
    /// choice deterministic.
    pub fn find_lru_live(&self, now: DateTime<Utc>) -> Option<String> {
        let mut candidate: Option<(&String, &CacheEntry)> = None;

        for (key, entry) in &self.entries {
            if entry.is_expired(now) {
                continue;
            }
            let replace = match candidate {
                None => true,
                Some((cand_key, cand_entry)) => {
                    entry.last_access < cand_entry.last_access
                        || (entry.last_access == cand_entry.last_access && key < cand_key)
                }
            };
            if replace {
                candidate = Some((key, entry));
            }
        }

        candidate.map(|(key, _)| key.clone())
    }

    /// Removes every entry expired at `now` and returns the removed keys.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }

        expired
    }

    /// Materializes all non-expired entries for a snapshot.
    pub fn snapshot_entries(&self, now: DateTime<Utc>) -> Vec<(String, String, Expiry)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone(), entry.expires_at))
            .collect()
    }

    /// Replaces the full contents of the index.
    pub fn replace_all(&mut self, entries: HashMap<String, CacheEntry>) {
        self.entries = entries;
    }

    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
