//! Snapshot Module
//!
//! Point-in-time full dump of the cache, used to bound AOF growth. The
//! document is a single JSON object:
//!
//! ```text
//! {"version":"1.0","timestamp":"...","entries":[{"key":..,"value":..,"expires_at":..}]}
//! ```
//!
//! `expires_at` uses the zero-time sentinel for entries without expiry.
//! Writes go to a temporary file that is fsync'd and atomically renamed over
//! the target, so a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::Expiry;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

// == Snapshot Document ==
/// A single key-value pair with its expiration in a snapshot.
///
/// `last_access` is deliberately not persisted; LRU order does not survive a
/// restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Expiry,
}

/// The full cache state saved to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Builds a snapshot document from materialized index entries.
    pub fn new(entries: Vec<(String, String, Expiry)>, now: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp: now,
            entries: entries
                .into_iter()
                .map(|(key, value, expires_at)| SnapshotEntry {
                    key,
                    value,
                    expires_at,
                })
                .collect(),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

// == Save ==
/// Serializes `snapshot` to `path` atomically: write `<path>.tmp`, fsync,
/// close, rename over the target.
pub fn save(snapshot: &Snapshot, path: &Path) -> io::Result<()> {
    let tmp = tmp_path(path);

    let result = (|| {
        let file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&file, snapshot)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

// == Load ==
/// Reads a snapshot from `path`.
///
/// Returns `None` when the file is absent, empty, or cannot be decoded; the
/// AOF is authoritative, so a bad snapshot never fails startup.
pub fn load(path: &Path) -> Option<Snapshot> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return None,
    };
    if metadata.len() == 0 {
        return None;
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("Failed to open snapshot {}: {}", path.display(), err);
            return None;
        }
    };

    match serde_json::from_reader(io::BufReader::new(file)) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!("Failed to decode snapshot {}: {}", path.display(), err);
            None
        }
    }
}
