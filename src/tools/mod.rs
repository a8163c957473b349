//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `query`: execute SELECT queries with formatting and history tracking
//! - `schema`: list tables/schemas, describe tables, fetch indexes
//! - `stats`: aggregate database statistics
//! - `history`: the bounded query history and its retrieval tool
//! - `validator`: lexical query validation and identifier sanitization
//! - `format`: result serialization to JSON, CSV, and Markdown

pub mod format;
pub mod history;
pub mod query;
pub mod schema;
pub mod stats;
pub mod validator;

pub use history::{HistoryToolHandler, QueryHistory};
pub use query::QueryToolHandler;
pub use schema::SchemaToolHandler;
pub use stats::StatsToolHandler;
