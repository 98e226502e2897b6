//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals
//! - Snapshot: Writes a full snapshot and truncates the AOF

mod cleanup;
mod snapshot;

pub use cleanup::spawn_cleanup_task;
pub use snapshot::spawn_snapshot_task;
