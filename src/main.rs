//! PostgreSQL MCP Server - Main entry point.
//!
//! Exposes read-only query and introspection tools for a PostgreSQL
//! database over the MCP protocol.

use clap::Parser;
use pg_mcp_server::config::Config;
use pg_mcp_server::db::DatabasePool;
use pg_mcp_server::tools::QueryHistory;
use pg_mcp_server::transport::{StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        // Logs go to stderr; stdout carries the MCP protocol stream.
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    info!(
        database = %config.display_target(),
        "Starting PostgreSQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Pool initialization failure is fatal; no partial pool keeps running.
    let pool = match DatabasePool::connect(&config).await {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(error = %e, "Failed to initialize database pool");
            return Err(e.into());
        }
    };

    let history = Arc::new(QueryHistory::new(config.history_size));

    let transport = StdioTransport::new(pool.clone(), history);
    let result = transport.run().await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
        pool.close().await;
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
