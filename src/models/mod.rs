//! Data models for the PostgreSQL MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{
    DEFAULT_HISTORY_LIMIT, GetQueryHistoryInput, MAX_HISTORY_LIMIT, MAX_QUERY_TIMEOUT_SECS,
    OutputFormat, QueryDatabaseInput, QueryDatabaseOutput, QueryHistoryEntry, QueryHistoryOutput,
};
pub use schema::{
    ColumnInfo, DEFAULT_SCHEMA, DatabaseStats, DescribeTableInput, ForeignKeyInfo,
    GetTableIndexesInput, GetTableIndexesOutput, IndexInfo, ListSchemasOutput, ListTablesInput,
    ListTablesOutput, TableDescription, TableInfo,
};
