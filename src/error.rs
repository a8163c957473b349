//! Error types for the PostgreSQL MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Each variant carries a human-readable message so tool callers can
//! understand and recover from error conditions.

use thiserror::Error;

/// Default budget reported for pool-acquire timeouts when the real bound is
/// not known at the mapping site.
const DEFAULT_ACQUIRE_BUDGET_SECS: f64 = 10.0;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Query validation failed: {message}")]
    Validation { message: String },

    #[error("Timeout: {operation} exceeded {budget_secs}s")]
    Timeout { operation: String, budget_secs: f64 },

    #[error("Permission denied: {message}")]
    Permission { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("SQL error: {message}")]
    Syntax { message: String },

    #[error("Database error: {message}")]
    Execution { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a timeout error with the exceeded budget in seconds.
    pub fn timeout(operation: impl Into<String>, budget_secs: f64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            budget_secs,
        }
    }

    /// Create a permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable by retrying with corrected input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Connection { .. })
    }
}

/// Classify a database-reported error by its SQLSTATE code.
///
/// The interesting classes:
/// - `57014` query_canceled: the statement exceeded its timeout budget
/// - `25006` read_only_sql_transaction: a write reached the read-only session
/// - `42P01` / `42703`: undefined table / undefined column
/// - `3D000` invalid_catalog_name: the database does not exist
/// - `28xxx`: authentication failures
/// - other `42xxx`: syntax errors and access-rule violations
pub(crate) fn classify_sqlstate(code: Option<&str>, message: &str) -> DbError {
    match code {
        Some("57014") => DbError::timeout("query execution", 0.0),
        Some("25006") => DbError::permission(
            "write operations (INSERT, UPDATE, DELETE, etc.) are not allowed",
        ),
        Some("42P01") => DbError::not_found(format!("table does not exist: {message}")),
        Some("42703") => DbError::not_found(format!("column does not exist: {message}")),
        Some("3D000") => DbError::not_found(format!("database does not exist: {message}")),
        Some(code) if code.starts_with("28") => {
            DbError::connection(format!("authentication failed: {message}"))
        }
        Some(code) if code.starts_with("42") => DbError::syntax(message.to_string()),
        _ => DbError::execution(message.to_string()),
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::config(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                classify_sqlstate(code.as_deref(), db_err.message())
            }
            sqlx::Error::RowNotFound => DbError::not_found("no rows returned"),
            sqlx::Error::PoolTimedOut => {
                DbError::timeout("connection pool acquire", DEFAULT_ACQUIRE_BUDGET_SECS)
            }
            sqlx::Error::PoolClosed => DbError::connection("connection pool is closed"),
            sqlx::Error::Io(io_err) => DbError::connection(format!("I/O error: {io_err}")),
            sqlx::Error::Tls(tls_err) => DbError::connection(format!("TLS error: {tls_err}")),
            sqlx::Error::Protocol(msg) => DbError::connection(format!("protocol error: {msg}")),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::not_found(format!("column not found: {col}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::execution(format!(
                "column index {index} out of bounds (len: {len})"
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::execution(format!("failed to decode column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => DbError::execution(format!("decode error: {source}")),
            sqlx::Error::WorkerCrashed => DbError::execution("database worker crashed"),
            _ => DbError::execution(format!("unknown database error: {err}")),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("failed to connect");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_timeout_display_includes_budget() {
        let err = DbError::timeout("query execution", 5.0);
        assert!(err.to_string().contains("5s"));
        assert!(err.to_string().contains("query execution"));
    }

    #[test]
    fn test_error_recoverable() {
        assert!(DbError::validation("bad query").is_recoverable());
        assert!(DbError::timeout("query", 30.0).is_recoverable());
        assert!(DbError::not_found("no such table").is_recoverable());
        assert!(!DbError::connection("refused").is_recoverable());
        assert!(!DbError::config("missing host").is_recoverable());
    }

    #[test]
    fn test_classify_query_canceled_as_timeout() {
        let err = classify_sqlstate(Some("57014"), "canceling statement due to statement timeout");
        assert!(matches!(err, DbError::Timeout { .. }));
    }

    #[test]
    fn test_classify_readonly_violation_as_permission() {
        let err = classify_sqlstate(
            Some("25006"),
            "cannot execute INSERT in a read-only transaction",
        );
        assert!(matches!(err, DbError::Permission { .. }));
    }

    #[test]
    fn test_classify_undefined_table_as_not_found() {
        let err = classify_sqlstate(Some("42P01"), "relation \"missing\" does not exist");
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_classify_undefined_column_as_not_found() {
        let err = classify_sqlstate(Some("42703"), "column \"nope\" does not exist");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_classify_invalid_catalog_as_not_found() {
        let err = classify_sqlstate(Some("3D000"), "database \"nodb\" does not exist");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_classify_auth_failure_as_connection() {
        let err = classify_sqlstate(Some("28P01"), "password authentication failed");
        assert!(matches!(err, DbError::Connection { .. }));
    }

    #[test]
    fn test_classify_syntax_error() {
        let err = classify_sqlstate(Some("42601"), "syntax error at or near \"SELEC\"");
        assert!(matches!(err, DbError::Syntax { .. }));
    }

    #[test]
    fn test_classify_insufficient_privilege_as_syntax() {
        // Access-control denials surface through the same SQL error bucket
        // as malformed statements.
        let err = classify_sqlstate(Some("42501"), "permission denied for table secrets");
        assert!(matches!(err, DbError::Syntax { .. }));
    }

    #[test]
    fn test_classify_unknown_code_as_execution() {
        let err = classify_sqlstate(Some("XX000"), "internal error");
        assert!(matches!(err, DbError::Execution { .. }));
    }

    #[test]
    fn test_classify_no_code_as_execution() {
        let err = classify_sqlstate(None, "something broke");
        assert!(matches!(err, DbError::Execution { .. }));
    }
}
