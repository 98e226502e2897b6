//! Persistence Module
//!
//! Durable recovery across process crashes: an append-only command log plus
//! periodic full-state snapshots. Startup loads the snapshot first, then
//! replays the AOF on top of it.

pub mod aof;
pub mod snapshot;

pub use aof::{replay, AofCommand, AofWriter, ReplayStats};
pub use snapshot::{Snapshot, SnapshotEntry, SNAPSHOT_VERSION};
