//! PostgreSQL MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI
//! assistants to safely query a PostgreSQL database. Every statement runs
//! inside a read-only transaction; write operations never reach the
//! database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::PgService;
