//! Configuration handling for the PostgreSQL MCP server.
//!
//! All connection parameters are consumed once at startup from environment
//! variables (or CLI flags); there is no runtime reconfiguration.

use crate::error::{DbError, DbResult};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_POOL_MIN_SIZE: u32 = 2;
pub const DEFAULT_POOL_MAX_SIZE: u32 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 60.0;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: f64 = 10.0;
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Configuration for the PostgreSQL MCP server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pg-mcp-server",
    about = "Read-only MCP server for PostgreSQL databases",
    version,
    author
)]
pub struct Config {
    /// PostgreSQL host
    #[arg(long, env = "POSTGRES_HOST")]
    pub host: String,

    /// PostgreSQL port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "POSTGRES_PORT")]
    pub port: u16,

    /// Database name
    #[arg(long, env = "POSTGRES_DATABASE")]
    pub database: String,

    /// Database user
    #[arg(long, env = "POSTGRES_USER")]
    pub user: String,

    /// Database password (sensitive - never logged)
    #[arg(long, default_value = "", env = "POSTGRES_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Minimum connections kept in the pool
    #[arg(long, default_value_t = DEFAULT_POOL_MIN_SIZE, env = "POSTGRES_POOL_MIN_SIZE")]
    pub pool_min_size: u32,

    /// Maximum connections allowed in the pool
    #[arg(long, default_value_t = DEFAULT_POOL_MAX_SIZE, env = "POSTGRES_POOL_MAX_SIZE")]
    pub pool_max_size: u32,

    /// Default statement timeout in seconds
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS, env = "POSTGRES_COMMAND_TIMEOUT")]
    pub command_timeout: f64,

    /// Connection acquire timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECTION_TIMEOUT_SECS, env = "POSTGRES_CONNECTION_TIMEOUT")]
    pub connection_timeout: f64,

    /// Maximum number of entries kept in the query history
    #[arg(long, default_value_t = DEFAULT_HISTORY_SIZE, env = "QUERY_HISTORY_SIZE")]
    pub history_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate all configured bounds. Fails startup on any violation.
    pub fn validate(&self) -> DbResult<()> {
        if self.host.trim().is_empty() {
            return Err(DbError::config("POSTGRES_HOST must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(DbError::config("POSTGRES_DATABASE must not be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(DbError::config("POSTGRES_USER must not be empty"));
        }
        if self.port == 0 {
            return Err(DbError::config("port must be between 1 and 65535"));
        }
        if self.pool_min_size < 1 {
            return Err(DbError::config("pool_min_size must be at least 1"));
        }
        if self.pool_max_size < self.pool_min_size {
            return Err(DbError::config(format!(
                "pool_min_size ({}) cannot exceed pool_max_size ({})",
                self.pool_min_size, self.pool_max_size
            )));
        }
        if self.command_timeout <= 0.0 {
            return Err(DbError::config("command_timeout must be positive"));
        }
        if self.connection_timeout <= 0.0 {
            return Err(DbError::config("connection_timeout must be positive"));
        }
        if self.history_size < 1 {
            return Err(DbError::config("history_size must be at least 1"));
        }
        Ok(())
    }

    /// Get the default statement timeout as a Duration.
    pub fn command_timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout)
    }

    /// Get the connection acquire timeout as a Duration.
    pub fn connection_timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.connection_timeout)
    }

    /// Connection summary safe for logging (no password).
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            pool_min_size: DEFAULT_POOL_MIN_SIZE,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT_SECS,
            history_size: DEFAULT_HISTORY_SIZE,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
