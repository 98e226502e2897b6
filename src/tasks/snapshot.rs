//! Snapshot Task
//!
//! Background task that periodically writes a full snapshot and truncates
//! the AOF, bounding log growth between restarts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache::CacheStore;

/// Spawns a background task that runs snapshot-then-truncate on an interval.
///
/// The whole save-and-truncate sequence runs under the store write lock, so
/// no command can land between snapshot capture and log truncation. A failed
/// snapshot leaves the AOF untouched.
///
/// # Arguments
/// * `cache` - Shared reference to the cache store
/// * `snapshot_path` - Destination file for snapshots
/// * `snapshot_interval_secs` - Interval in seconds between snapshots
///
/// # Returns
/// A JoinHandle for the spawned task; abort it during graceful shutdown,
/// before the store is closed.
pub fn spawn_snapshot_task(
    cache: Arc<RwLock<CacheStore>>,
    snapshot_path: PathBuf,
    snapshot_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(snapshot_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting snapshot task with interval of {} seconds",
            snapshot_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let result = {
                let mut cache_guard = cache.write().await;
                cache_guard.snapshot_and_clear(&snapshot_path)
            };

            match result {
                Ok(()) => info!("Snapshot written to {}", snapshot_path.display()),
                Err(err) => error!("Snapshot failed: {}", err),
            }
        }
    })
}
