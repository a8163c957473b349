//! Connection pool management and read-only query execution.
//!
//! The pool is the sole owner of physical connections. Every statement runs
//! inside a transaction explicitly marked read-only at the database session
//! level; this is the authoritative write-prevention boundary, independent
//! of the lexical validation in [`crate::tools::validator`]. Even a
//! forbidden statement that slipped past the validator is refused by the
//! server itself.

use crate::config::Config;
use crate::error::{DbError, DbResult};
use futures_util::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Row};
use std::time::Duration;
use tracing::{debug, info, warn};

/// PostgreSQL connection pool with read-only transaction enforcement.
#[derive(Debug)]
pub struct DatabasePool {
    pool: PgPool,
    command_timeout: Duration,
}

impl DatabasePool {
    /// Open the pool and verify connectivity with a liveness probe.
    ///
    /// Any failure during setup is fatal to process startup; no partial
    /// pool is kept running.
    pub async fn connect(config: &Config) -> DbResult<Self> {
        info!(database = %config.display_target(), "Initializing database connection pool");

        let command_timeout = config.command_timeout_duration();
        let statement_timeout_ms = command_timeout.as_millis();

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            // Pool-wide default statement deadline; per-query timeouts
            // override it with SET LOCAL inside their own transaction.
            .options([("statement_timeout", statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min_size)
            .max_connections(config.pool_max_size)
            .acquire_timeout(config.connection_timeout_duration())
            .connect_with(options)
            .await
            .map_err(|e| connect_error(DbError::from(e), config))?;

        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&pool)
            .await
            .map_err(|e| connect_error(DbError::from(e), config))?;
        info!(version = %version, "Database connection successful");
        info!(
            min = config.pool_min_size,
            max = config.pool_max_size,
            "Connection pool initialized"
        );

        Ok(Self {
            pool,
            command_timeout,
        })
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            Err(DbError::connection("connection pool is closed"))
        } else {
            Ok(())
        }
    }

    /// Execute a query inside a read-only, read-committed transaction and
    /// return the raw rows.
    ///
    /// If `timeout` is given it becomes the statement deadline for this
    /// transaction only (`SET LOCAL statement_timeout`); otherwise the
    /// pool-wide default applies. A timed-out statement is canceled at the
    /// database session and the connection returns to the pool clean.
    pub async fn execute_readonly(
        &self,
        query: &str,
        timeout: Option<Duration>,
    ) -> DbResult<Vec<PgRow>> {
        self.ensure_open()?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        (&mut *tx)
            .execute("SET TRANSACTION ISOLATION LEVEL READ COMMITTED READ ONLY")
            .await
            .map_err(DbError::from)?;

        if let Some(timeout) = timeout {
            let statement = format!("SET LOCAL statement_timeout = {}", timeout.as_millis());
            (&mut *tx)
                .execute(statement.as_str())
                .await
                .map_err(DbError::from)?;
        }

        debug!(timeout = ?timeout, "Executing read-only query");

        // Plain-text execution (no prepared statement), matching how the
        // result decoder reads values.
        let rows: Vec<PgRow> = match (&mut *tx).fetch(query).try_collect().await {
            Ok(rows) => rows,
            // Rollback is implicit when the transaction drops.
            Err(e) => return Err(self.map_execution_error(DbError::from(e), timeout)),
        };

        tx.commit().await.map_err(DbError::from)?;
        Ok(rows)
    }

    /// Attach the actual budget to timeout errors and flag validator
    /// bypasses distinctly from ordinary validation failures.
    fn map_execution_error(&self, err: DbError, timeout: Option<Duration>) -> DbError {
        match err {
            DbError::Timeout { operation, .. } => {
                let budget = timeout.unwrap_or(self.command_timeout).as_secs_f64();
                warn!(budget_secs = budget, "Query canceled by statement timeout");
                DbError::timeout(operation, budget)
            }
            DbError::Permission { .. } => {
                warn!("Write statement reached the read-only session (validator bypass)");
                err
            }
            other => other,
        }
    }

    /// Execute a query and return the first column of the first row.
    pub async fn execute_scalar<T>(&self, query: &str) -> DbResult<T>
    where
        T: Send + Unpin + for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        let rows = self.execute_readonly(query, None).await?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::not_found("query returned no rows"))?;
        row.try_get::<T, _>(0).map_err(DbError::from)
    }

    /// Execute a query and return the first row, if any.
    pub async fn execute_single_row(&self, query: &str) -> DbResult<Option<PgRow>> {
        let mut rows = self.execute_readonly(query, None).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// Check liveness with a trivial probe. Never errors.
    pub async fn health_check(&self) -> bool {
        if self.pool.is_closed() {
            return false;
        }
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Health check failed");
                false
            }
        }
    }

    /// Number of live connections currently held by the pool.
    pub fn connection_count(&self) -> u32 {
        self.pool.size()
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Drain and release all connections. Idempotent; all execution calls
    /// fail once the pool is closed.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Connection pool closed");
    }
}

/// Shape a startup connection failure into an actionable error.
fn connect_error(err: DbError, config: &Config) -> DbError {
    match &err {
        DbError::Connection { message } if message.contains("authentication") => {
            DbError::connection("invalid database credentials")
        }
        DbError::NotFound { .. } => {
            DbError::connection(format!("database '{}' not found", config.database))
        }
        DbError::Config { .. } | DbError::Connection { .. } => err,
        _ => DbError::connection(err.to_string()),
    }
}
