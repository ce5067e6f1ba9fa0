#![forbid(unsafe_code)]

use std::process;

use anyhow::Context;
use axum::Router;
use docqa_cli::config::{Cli, MiddlewareConfig};
use docqa_cli::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP, server, telemetry};
use docqa_rig::RagService;
use docqa_server::handler::routes;
use docqa_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use docqa_server::service::ServiceState;

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format_args!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    telemetry::init_tracing("info")?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting docqa server"
    );

    cli.log();
    cli.validate()?;

    let settings = cli.sources.resolve_settings()?;
    let rag = RagService::from_settings(settings).context("failed to create pipeline service")?;
    let state = ServiceState::new(&cli.service, rag);
    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server).await?;
    Ok(())
}

/// Applies middleware; the last layer added is the outermost.
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes(state)
        .with_security(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
