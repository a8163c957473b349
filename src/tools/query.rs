//! Query execution tool.
//!
//! Implements the `query_database` tool: lexical validation, read-only
//! execution with an optional per-call timeout, output formatting, and
//! history recording for both successes and failures.

use crate::db::{DatabasePool, types};
use crate::error::DbResult;
use crate::models::{OutputFormat, QueryDatabaseInput, QueryDatabaseOutput, QueryHistoryEntry};
use crate::tools::format::format_rows;
use crate::tools::history::QueryHistory;
use crate::tools::validator;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Handler for the query_database tool.
pub struct QueryToolHandler {
    pool: Arc<DatabasePool>,
    history: Arc<QueryHistory>,
}

impl QueryToolHandler {
    pub fn new(pool: Arc<DatabasePool>, history: Arc<QueryHistory>) -> Self {
        Self { pool, history }
    }

    /// Execute a SELECT query and return formatted results.
    ///
    /// The call is timed end-to-end (wall clock, including the database
    /// round trip) and its outcome is recorded in the query history.
    /// Failures are recorded with row_count 0 and the error message, then
    /// re-raised to the caller.
    pub async fn query_database(
        &self,
        input: QueryDatabaseInput,
    ) -> DbResult<QueryDatabaseOutput> {
        input.validate()?;

        let timeout = input.timeout.map(Duration::from_secs_f64);
        let start = Instant::now();

        let result = self.execute(&input.query, timeout, input.format).await;
        let execution_time_ms = elapsed_ms(start);

        match result {
            Ok((rows, columns, formatted_output)) => {
                let row_count = rows.len();
                self.history.record(QueryHistoryEntry::success(
                    &input.query,
                    execution_time_ms,
                    row_count,
                    input.format,
                ));

                info!(
                    row_count,
                    execution_time_ms,
                    format = %input.format,
                    "Query executed"
                );

                Ok(QueryDatabaseOutput {
                    rows,
                    row_count,
                    columns,
                    execution_time_ms,
                    format: input.format,
                    formatted_output,
                })
            }
            Err(e) => {
                self.history.record(QueryHistoryEntry::failure(
                    &input.query,
                    execution_time_ms,
                    input.format,
                    e.to_string(),
                ));

                error!(error = %e, "Query execution failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        query: &str,
        timeout: Option<Duration>,
        format: OutputFormat,
    ) -> DbResult<(
        Vec<serde_json::Map<String, JsonValue>>,
        Vec<String>,
        String,
    )> {
        validator::validate_query(query)?;

        let pg_rows = self.pool.execute_readonly(query, timeout).await?;

        let columns = pg_rows
            .first()
            .map(types::column_names)
            .unwrap_or_default();
        let rows: Vec<_> = pg_rows.iter().map(types::row_to_json_map).collect();
        let formatted_output = format_rows(&rows, format)?;

        Ok((rows, columns, formatted_output))
    }
}

/// Elapsed wall-clock milliseconds, rounded to two decimals.
fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_ms_is_non_negative() {
        let start = Instant::now();
        let ms = elapsed_ms(start);
        assert!(ms >= 0.0);
        assert!(ms.is_finite());
    }

    #[test]
    fn test_query_input_deserialization() {
        let json = r#"{
            "query": "SELECT 1 AS x",
            "format": "markdown",
            "timeout": 5.0
        }"#;

        let input: QueryDatabaseInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.query, "SELECT 1 AS x");
        assert_eq!(input.format, OutputFormat::Markdown);
        assert_eq!(input.timeout, Some(5.0));
    }
}
