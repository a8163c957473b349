//! Stdio transport for the MCP server.
//!
//! This transport reads JSON-RPC messages from stdin and writes responses
//! to stdout, following the MCP protocol specification.

use crate::db::DatabasePool;
use crate::error::{DbError, DbResult};
use crate::mcp::PgService;
use crate::tools::QueryHistory;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Stdio transport implementation.
pub struct StdioTransport {
    pool: Arc<DatabasePool>,
    history: Arc<QueryHistory>,
}

impl StdioTransport {
    /// Create a new stdio transport with the given pool and history.
    pub fn new(pool: Arc<DatabasePool>, history: Arc<QueryHistory>) -> Self {
        Self { pool, history }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = PgService::new(self.pool.clone(), self.history.clone());

        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            DbError::connection(format!("failed to start stdio transport: {e}"))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        return Err(DbError::connection(format!("stdio transport error: {e}")));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // Spawn a task to listen for a second signal and force exit
            tokio::spawn(async {
                wait_for_signal().await;
                tracing::warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing database connection pool");
        self.pool.close().await;

        if shutdown_requested {
            // Force exit since stdio may still be blocking on stdin
            // tokio::select! cannot interrupt blocking stdin reads
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
