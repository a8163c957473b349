//! Database access layer.
//!
//! This module provides the connection pool with read-only transaction
//! enforcement and the row-to-JSON value decoding.

pub mod pool;
pub mod types;

pub use pool::DatabasePool;
