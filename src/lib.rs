//! duracache - A lightweight persistent in-memory cache server
//!
//! Redis-like functionality with TTL expiration, LRU eviction and durable
//! recovery via an append-only command log plus periodic snapshots.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persist;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_snapshot_task};
