//! Query-related data models.
//!
//! This module defines the typed request/response shapes for the
//! `query_database` and `get_query_history` tools, plus the history entry
//! record itself. Every input struct validates its own fields before any
//! database work happens.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum per-query timeout in seconds.
pub const MAX_QUERY_TIMEOUT_SECS: f64 = 300.0;

/// Default number of history entries returned by get_query_history.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Maximum number of history entries returned by get_query_history.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of row objects (default)
    #[default]
    Json,
    /// Comma-separated values with a header row
    Csv,
    /// Markdown table
    Markdown,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// Input for the query_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryDatabaseInput {
    /// SQL SELECT statement to execute. Write operations are blocked.
    pub query: String,
    /// Output format: json (default), csv, or markdown
    #[serde(default)]
    pub format: OutputFormat,
    /// Optional statement timeout in seconds (max 300)
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl QueryDatabaseInput {
    /// Validate field-level bounds before touching the database.
    pub fn validate(&self) -> DbResult<()> {
        if let Some(timeout) = self.timeout {
            if timeout <= 0.0 {
                return Err(DbError::validation("timeout must be positive"));
            }
            if timeout > MAX_QUERY_TIMEOUT_SECS {
                return Err(DbError::validation(format!(
                    "timeout cannot exceed {MAX_QUERY_TIMEOUT_SECS} seconds"
                )));
            }
        }
        Ok(())
    }
}

/// Output from the query_database tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryDatabaseOutput {
    /// Result rows as key-value maps in original column order
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Number of rows returned
    pub row_count: usize,
    /// Column names in result order
    pub columns: Vec<String>,
    /// End-to-end execution time in milliseconds
    pub execution_time_ms: f64,
    /// Format applied to formatted_output
    pub format: OutputFormat,
    /// Result set rendered in the requested format
    pub formatted_output: String,
}

/// Input for the get_query_history tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetQueryHistoryInput {
    /// Maximum number of queries to return (default: 20, max: 100)
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for GetQueryHistoryInput {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl GetQueryHistoryInput {
    /// Validate the limit bounds before reading history.
    pub fn validate(&self) -> DbResult<()> {
        if self.limit < 1 {
            return Err(DbError::validation("limit must be at least 1"));
        }
        if self.limit > MAX_HISTORY_LIMIT {
            return Err(DbError::validation(format!(
                "limit cannot exceed {MAX_HISTORY_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Output from the get_query_history tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryHistoryOutput {
    /// Recent queries, newest first
    pub queries: Vec<QueryHistoryEntry>,
}

/// A single executed query with its outcome metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryHistoryEntry {
    /// SQL text as submitted
    pub query: String,
    /// When the query was executed
    pub timestamp: DateTime<Utc>,
    /// End-to-end execution time in milliseconds
    pub execution_time_ms: f64,
    /// Rows returned (0 for failures)
    pub row_count: usize,
    /// Output format requested
    pub format: OutputFormat,
    /// Whether the query succeeded
    pub success: bool,
    /// Error message for failed queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryHistoryEntry {
    /// Record a successful execution.
    pub fn success(
        query: impl Into<String>,
        execution_time_ms: f64,
        row_count: usize,
        format: OutputFormat,
    ) -> Self {
        Self {
            query: query.into(),
            timestamp: Utc::now(),
            execution_time_ms,
            row_count,
            format,
            success: true,
            error: None,
        }
    }

    /// Record a failed execution. Failures always carry row_count 0.
    pub fn failure(
        query: impl Into<String>,
        execution_time_ms: f64,
        format: OutputFormat,
        error: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            timestamp: Utc::now(),
            execution_time_ms,
            row_count: 0,
            format,
            success: false,
            error: Some(error.into()),
        }
    }
}
