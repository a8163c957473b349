//! Schema introspection tools.
//!
//! Implements the `list_tables`, `describe_table`, `list_schemas`, and
//! `get_table_indexes` tools. Table and schema names are interpolated into
//! catalog SQL text, so every one of them passes through
//! [`validator::sanitize_identifier`] first; the catalog-query idioms used
//! here cannot take them as bound parameters.

use crate::db::DatabasePool;
use crate::error::DbResult;
use crate::models::{
    ColumnInfo, DescribeTableInput, ForeignKeyInfo, GetTableIndexesInput, GetTableIndexesOutput,
    IndexInfo, ListSchemasOutput, ListTablesInput, ListTablesOutput, TableDescription, TableInfo,
};
use crate::tools::validator;
use sqlx::Row;
use std::sync::Arc;
use tracing::info;

/// Format bytes as a human-readable size string (1024-based units).
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Handler for the schema introspection tools.
pub struct SchemaToolHandler {
    pool: Arc<DatabasePool>,
}

impl SchemaToolHandler {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// List tables with size and row-count estimates, optionally filtered
    /// by schema.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let query = match &input.schema {
            Some(schema) => {
                let schema = validator::sanitize_identifier(schema)?;
                format!(
                    "SELECT \
                         schemaname AS schema, \
                         tablename AS name, \
                         pg_total_relation_size(schemaname || '.' || tablename)::bigint AS size_bytes \
                     FROM pg_tables \
                     WHERE schemaname = '{schema}' \
                     ORDER BY schemaname, tablename"
                )
            }
            None => "SELECT \
                         schemaname AS schema, \
                         tablename AS name, \
                         pg_total_relation_size(schemaname || '.' || tablename)::bigint AS size_bytes \
                     FROM pg_tables \
                     WHERE schemaname NOT IN ('pg_catalog', 'information_schema') \
                     ORDER BY schemaname, tablename"
                .to_string(),
        };

        let rows = self.pool.execute_readonly(&query, None).await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: String = row.try_get("schema")?;
            let name: String = row.try_get("name")?;
            let size_bytes: Option<i64> = row.try_get("size_bytes")?;

            let estimate_query = format!(
                "SELECT reltuples::bigint FROM pg_class WHERE oid = '{schema}.{name}'::regclass"
            );
            let estimate: Option<i64> = self.pool.execute_scalar(&estimate_query).await?;

            tables.push(TableInfo {
                schema,
                name,
                row_count_estimate: estimate.filter(|v| *v != 0),
                size: size_bytes.map(|b| format_size(b.max(0) as u64)),
            });
        }

        info!(count = tables.len(), "Listed tables");
        Ok(ListTablesOutput { tables })
    }

    /// Get detailed table structure: columns, indexes, and foreign keys.
    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<TableDescription> {
        input.validate()?;
        let table = validator::sanitize_identifier(&input.table_name)?;
        let schema = validator::sanitize_identifier(&input.schema)?;

        // ::text casts collapse the information_schema domain types into
        // plain text for decoding.
        let columns_query = format!(
            "SELECT \
                 c.column_name::text AS name, \
                 c.data_type::text AS type, \
                 c.is_nullable = 'YES' AS nullable, \
                 c.column_default::text AS default_value, \
                 CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END AS is_primary_key \
             FROM information_schema.columns c \
             LEFT JOIN ( \
                 SELECT ku.column_name \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage ku \
                     ON tc.constraint_name = ku.constraint_name \
                     AND tc.table_schema = ku.table_schema \
                 WHERE tc.constraint_type = 'PRIMARY KEY' \
                     AND tc.table_name = '{table}' \
                     AND tc.table_schema = '{schema}' \
             ) pk ON c.column_name = pk.column_name \
             WHERE c.table_name = '{table}' \
                 AND c.table_schema = '{schema}' \
             ORDER BY c.ordinal_position"
        );

        let column_rows = self.pool.execute_readonly(&columns_query, None).await?;
        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            columns.push(ColumnInfo {
                name: row.try_get("name")?,
                data_type: row.try_get("type")?,
                nullable: row.try_get("nullable")?,
                default: row.try_get("default_value")?,
                primary_key: row.try_get("is_primary_key")?,
            });
        }

        let indexes = self.fetch_indexes(table, schema).await?;
        let foreign_keys = self.fetch_foreign_keys(table, schema).await?;

        info!(
            table = %table,
            schema = %schema,
            columns = columns.len(),
            indexes = indexes.len(),
            foreign_keys = foreign_keys.len(),
            "Described table"
        );

        Ok(TableDescription {
            schema: schema.to_string(),
            table: table.to_string(),
            columns,
            indexes,
            foreign_keys,
        })
    }

    /// List all schemas, excluding PostgreSQL-internal ones.
    pub async fn list_schemas(&self) -> DbResult<ListSchemasOutput> {
        let query = "SELECT schema_name::text \
                     FROM information_schema.schemata \
                     WHERE schema_name NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
                     ORDER BY schema_name";

        let rows = self.pool.execute_readonly(query, None).await?;
        let schemas = rows
            .iter()
            .map(|row| row.try_get("schema_name").map_err(Into::into))
            .collect::<DbResult<Vec<String>>>()?;

        Ok(ListSchemasOutput { schemas })
    }

    /// Get indexes for a specific table.
    pub async fn get_table_indexes(
        &self,
        input: GetTableIndexesInput,
    ) -> DbResult<GetTableIndexesOutput> {
        input.validate()?;
        let table = validator::sanitize_identifier(&input.table_name)?;
        let schema = validator::sanitize_identifier(&input.schema)?;

        let indexes = self.fetch_indexes(table, schema).await?;
        Ok(GetTableIndexesOutput { indexes })
    }

    async fn fetch_indexes(&self, table: &str, schema: &str) -> DbResult<Vec<IndexInfo>> {
        let query = format!(
            "SELECT \
                 i.relname::text AS index_name, \
                 am.amname::text AS index_type, \
                 ARRAY_AGG(a.attname::text ORDER BY k.ordinality) AS columns, \
                 ix.indisunique AS is_unique, \
                 ix.indisprimary AS is_primary \
             FROM pg_index ix \
             JOIN pg_class t ON t.oid = ix.indrelid \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_am am ON i.relam = am.oid \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ordinality) \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
             WHERE t.relname = '{table}' \
                 AND n.nspname = '{schema}' \
             GROUP BY i.relname, am.amname, ix.indisunique, ix.indisprimary \
             ORDER BY i.relname"
        );

        let rows = self.pool.execute_readonly(&query, None).await?;
        let mut indexes = Vec::with_capacity(rows.len());
        for row in &rows {
            indexes.push(IndexInfo {
                name: row.try_get("index_name")?,
                index_type: row.try_get("index_type")?,
                columns: row.try_get("columns")?,
                unique: row.try_get("is_unique")?,
                primary: row.try_get("is_primary")?,
            });
        }
        Ok(indexes)
    }

    async fn fetch_foreign_keys(
        &self,
        table: &str,
        schema: &str,
    ) -> DbResult<Vec<ForeignKeyInfo>> {
        let query = format!(
            "SELECT \
                 tc.constraint_name::text AS fk_name, \
                 ARRAY_AGG(kcu.column_name::text ORDER BY kcu.ordinal_position) AS columns, \
                 ccu.table_name::text AS referenced_table, \
                 ARRAY_AGG(ccu.column_name::text ORDER BY kcu.ordinal_position) AS referenced_columns \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
                 ON tc.constraint_name = kcu.constraint_name \
                 AND tc.table_schema = kcu.table_schema \
             JOIN information_schema.constraint_column_usage ccu \
                 ON ccu.constraint_name = tc.constraint_name \
                 AND ccu.table_schema = tc.table_schema \
             WHERE tc.constraint_type = 'FOREIGN KEY' \
                 AND tc.table_name = '{table}' \
                 AND tc.table_schema = '{schema}' \
             GROUP BY tc.constraint_name, ccu.table_name"
        );

        let rows = self.pool.execute_readonly(&query, None).await?;
        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in &rows {
            foreign_keys.push(ForeignKeyInfo {
                name: row.try_get("fk_name")?,
                columns: row.try_get("columns")?,
                referenced_table: row.try_get("referenced_table")?,
                referenced_columns: row.try_get("referenced_columns")?,
            });
        }
        Ok(foreign_keys)
    }
}
