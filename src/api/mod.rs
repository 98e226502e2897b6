//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /` - Health check
//! - `POST /set` - Store a key-value pair
//! - `GET /get?key=<k>` - Retrieve a value by key
//! - `POST /del` - Delete a key
//! - `GET /stats` - Get cache statistics

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
