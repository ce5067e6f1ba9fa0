//! HTTP server startup with graceful shutdown.

mod lifecycle;
mod shutdown;

use std::io;

use axum::Router;
use tokio::net::TcpListener;

pub use self::lifecycle::serve_with_shutdown;
pub use self::shutdown::shutdown_signal;
use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;

/// Binds the configured address and serves `app` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops with an error.
pub async fn serve(app: Router, config: ServerConfig) -> io::Result<()> {
    let addr = config.server_addr();
    let listener = TcpListener::bind(addr).await.inspect_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %addr,
            error = %err,
            "Failed to bind to address"
        );
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %addr,
        "Server is ready and listening for connections"
    );

    let shutdown = shutdown_signal(config.shutdown_timeout());
    serve_with_shutdown(&config, || async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    })
    .await
}
