//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the append-only command log
    pub aof_path: String,
    /// Path of the periodic snapshot file
    pub snapshot_path: String,
    /// Maximum number of live keys (0 = unlimited)
    pub max_keys: usize,
    /// Interval in seconds between snapshot-then-truncate runs
    pub snapshot_interval: u64,
    /// Background expiry cleanup interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `AOF_PATH` - Append-only file path (default: data/appendonly.aof)
    /// - `SNAPSHOT_PATH` - Snapshot file path (default: data/dump.rdb)
    /// - `MAX_KEYS` - Maximum live keys, 0 = unlimited (default: 0)
    /// - `SNAPSHOT_INTERVAL` - Snapshot frequency in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    pub fn from_env() -> Self {
        Self {
            aof_path: env::var("AOF_PATH").unwrap_or_else(|_| "data/appendonly.aof".to_string()),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| "data/dump.rdb".to_string()),
            max_keys: env::var("MAX_KEYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            snapshot_interval: env::var("SNAPSHOT_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aof_path: "data/appendonly.aof".to_string(),
            snapshot_path: "data/dump.rdb".to_string(),
            max_keys: 0,
            snapshot_interval: 300,
            cleanup_interval: 1,
            server_port: 8080,
        }
    }
}
