//! Schema introspection data models.
//!
//! Read-only projections of catalog metadata, rebuilt fresh on every call.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default schema used when the caller does not specify one.
pub const DEFAULT_SCHEMA: &str = "public";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Optional schema name to filter by
    #[serde(default)]
    pub schema: Option<String>,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe
    pub table_name: String,
    /// Schema name (default: public)
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl DescribeTableInput {
    pub fn validate(&self) -> DbResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(DbError::validation("table_name is required"));
        }
        Ok(())
    }
}

/// Input for the get_table_indexes tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableIndexesInput {
    /// Name of the table
    pub table_name: String,
    /// Schema name (default: public)
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl GetTableIndexesInput {
    pub fn validate(&self) -> DbResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(DbError::validation("table_name is required"));
        }
        Ok(())
    }
}

/// Information about a database table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableInfo {
    /// Schema containing the table
    pub schema: String,
    /// Table name
    pub name: String,
    /// Planner row estimate from pg_class.reltuples
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count_estimate: Option<i64>,
    /// Total relation size (data + indexes), human-readable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<TableInfo>,
}

/// Information about a table column.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    /// Data type as reported by information_schema
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub primary_key: bool,
}

/// Information about a table index.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IndexInfo {
    pub name: String,
    /// Access method (btree, hash, gin, ...)
    #[serde(rename = "type")]
    pub index_type: String,
    /// Indexed columns in key order
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
}

/// Information about a foreign key constraint.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ForeignKeyInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Complete description of a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableDescription {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Output from the list_schemas tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSchemasOutput {
    pub schemas: Vec<String>,
}

/// Output from the get_table_indexes tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetTableIndexesOutput {
    pub indexes: Vec<IndexInfo>,
}

/// Overall database statistics.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DatabaseStats {
    pub database_name: String,
    /// Human-readable database size (pg_size_pretty)
    pub size: String,
    /// Number of user tables
    pub table_count: i64,
    /// Live connections held by the pool
    pub connection_count: u32,
    /// Server version string
    pub version: String,
}
