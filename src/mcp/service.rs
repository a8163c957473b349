//! MCP service implementation using rmcp.
//!
//! This module defines the PgService struct exposing the database tools
//! via the MCP protocol using the rmcp framework's macros. Every handler
//! failure is returned to the transport as a structured
//! `{"error": ..., "tool": ...}` payload rather than a protocol-level
//! fault, so the serving loop never crashes on a bad query.

use crate::db::DatabasePool;
use crate::error::DbResult;
use crate::models::{
    DescribeTableInput, GetQueryHistoryInput, GetTableIndexesInput, ListTablesInput,
    QueryDatabaseInput,
};
use crate::tools::{
    HistoryToolHandler, QueryHistory, QueryToolHandler, SchemaToolHandler, StatsToolHandler,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Convert a handler outcome into a tool result.
///
/// Successes serialize the typed payload as pretty JSON; failures become a
/// structured error object naming the failing tool.
fn tool_result<T: Serialize>(tool: &str, result: DbResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(payload) => {
            let text = serde_json::to_string_pretty(&payload)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(err) => {
            error!(tool, error = %err, "Tool execution failed");
            let payload = serde_json::json!({
                "error": err.to_string(),
                "tool": tool,
            });
            let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
            Ok(CallToolResult::error(vec![Content::text(text)]))
        }
    }
}

#[derive(Clone)]
pub struct PgService {
    /// Shared connection pool for all database operations
    pool: Arc<DatabasePool>,
    /// Shared query history buffer
    history: Arc<QueryHistory>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    /// Create a new PgService instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared connection pool for database operations
    /// * `history` - Shared query history buffer
    pub fn new(pool: Arc<DatabasePool>, history: Arc<QueryHistory>) -> Self {
        Self {
            pool,
            history,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Execute a SELECT query on the PostgreSQL database and return formatted results.\nWrite operations (INSERT/UPDATE/DELETE/DDL) are blocked.\nOutput format: json (default), csv, or markdown.\nOptional timeout in seconds (max 300)."
    )]
    async fn query_database(
        &self,
        Parameters(input): Parameters<QueryDatabaseInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.pool.clone(), self.history.clone());
        tool_result("query_database", handler.query_database(input).await)
    }

    #[tool(
        description = "List all tables in the database with size and row-count estimates.\nOptionally filter by schema name."
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.pool.clone());
        tool_result("list_tables", handler.list_tables(input).await)
    }

    #[tool(
        description = "Get detailed information about a table including columns, types, indexes, and foreign keys.\nSchema defaults to 'public'."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.pool.clone());
        tool_result("describe_table", handler.describe_table(input).await)
    }

    #[tool(description = "List all schemas in the database.")]
    async fn list_schemas(&self) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.pool.clone());
        tool_result("list_schemas", handler.list_schemas().await)
    }

    #[tool(
        description = "Get all indexes for a specific table.\nSchema defaults to 'public'."
    )]
    async fn get_table_indexes(
        &self,
        Parameters(input): Parameters<GetTableIndexesInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.pool.clone());
        tool_result("get_table_indexes", handler.get_table_indexes(input).await)
    }

    #[tool(
        description = "Retrieve recent query history with execution metadata.\nLimit: default 20, max 100."
    )]
    async fn get_query_history(
        &self,
        Parameters(input): Parameters<GetQueryHistoryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = HistoryToolHandler::new(self.history.clone());
        tool_result("get_query_history", handler.get_query_history(input))
    }

    #[tool(description = "Get overall database statistics and metadata.")]
    async fn get_database_stats(&self) -> Result<CallToolResult, McpError> {
        let handler = StatsToolHandler::new(self.pool.clone());
        tool_result("get_database_stats", handler.get_database_stats().await)
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pg-mcp-server".to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only tools for querying and inspecting a PostgreSQL database.\n\
                \n\
                ## Tools\n\
                - `query_database`: run a SELECT query (json/csv/markdown output)\n\
                - `list_tables`, `describe_table`, `list_schemas`, `get_table_indexes`:\n\
                  schema introspection\n\
                - `get_query_history`: recent queries with execution metadata\n\
                - `get_database_stats`: database size, table count, version\n\
                \n\
                All statements run inside a read-only transaction; INSERT, UPDATE,\n\
                DELETE, and DDL are rejected both lexically and at the database\n\
                session level."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;
    use crate::models::QueryHistoryEntry;

    fn result_json(result: Result<CallToolResult, McpError>) -> serde_json::Value {
        serde_json::to_value(result.unwrap()).unwrap()
    }

    #[test]
    fn test_tool_result_success_payload() {
        let json = result_json(tool_result(
            "get_query_history",
            Ok(serde_json::json!({"queries": []})),
        ));
        assert_ne!(json["isError"], serde_json::json!(true));
        let text = json["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.contains("queries"));
    }

    #[test]
    fn test_tool_result_error_payload_names_tool() {
        let json = result_json(tool_result::<()>(
            "query_database",
            Err(crate::error::DbError::validation("bad query")),
        ));
        assert_eq!(json["isError"], serde_json::json!(true));

        let text = json["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.contains("query_database"));
        assert!(text.contains("bad query"));
    }

    #[test]
    fn test_tool_result_serializes_history_entries() {
        let entry = QueryHistoryEntry::success("SELECT 1", 0.42, 1, OutputFormat::Json);
        let json = result_json(tool_result("get_query_history", Ok(vec![entry])));
        let text = json["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.contains("SELECT 1"));
        assert!(text.contains("execution_time_ms"));
    }
}
