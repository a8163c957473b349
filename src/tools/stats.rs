//! Database statistics tool.
//!
//! Implements the `get_database_stats` tool: database name, size, user
//! table count, live pool connection count, and server version.

use crate::db::DatabasePool;
use crate::error::{DbError, DbResult};
use crate::models::DatabaseStats;
use sqlx::Row;
use std::sync::Arc;

const STATS_QUERY: &str = "SELECT \
        current_database() AS db_name, \
        pg_size_pretty(pg_database_size(current_database())) AS db_size, \
        version() AS db_version";

const TABLE_COUNT_QUERY: &str = "SELECT COUNT(*) \
        FROM pg_tables \
        WHERE schemaname NOT IN ('pg_catalog', 'information_schema')";

/// Handler for the get_database_stats tool.
pub struct StatsToolHandler {
    pool: Arc<DatabasePool>,
}

impl StatsToolHandler {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Get overall database statistics and metadata.
    pub async fn get_database_stats(&self) -> DbResult<DatabaseStats> {
        let row = self
            .pool
            .execute_single_row(STATS_QUERY)
            .await?
            .ok_or_else(|| DbError::execution("statistics query returned no rows"))?;

        let database_name: String = row.try_get("db_name")?;
        let size: String = row.try_get("db_size")?;
        let version: String = row.try_get("db_version")?;

        let table_count: i64 = self.pool.execute_scalar(TABLE_COUNT_QUERY).await?;
        let connection_count = self.pool.connection_count();

        Ok(DatabaseStats {
            database_name,
            size,
            table_count,
            connection_count,
            version,
        })
    }
}
