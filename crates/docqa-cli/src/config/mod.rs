//! Command-line configuration.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # host, port, shutdown
//! ├── middleware: MiddlewareConfig  # CORS, request timeout
//! ├── service: ServiceConfig        # session lifetime
//! └── sources: SourceConfig         # .env and secrets.toml locations
//! ```
//!
//! Every flag falls back to an environment variable. Pipeline settings
//! (credentials, index, models) are not flags; they are resolved from
//! [`SourceConfig`].

mod middleware;
mod server;
mod sources;

use std::process;

use anyhow::Context;
use clap::Parser;
use docqa_server::service::ServiceConfig;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
pub use sources::{DEFAULT_ENV_FILE, DEFAULT_SECRETS_FILE, SourceConfig, load_env_file};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete command-line configuration of the `docqa` server.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a collection of PDF documents")]
#[command(version)]
pub struct Cli {
    /// Network binding and shutdown.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware.
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Session handling.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Locations of the `.env` and secrets files.
    #[clap(flatten)]
    pub sources: SourceConfig,
}

impl Cli {
    /// Loads the `.env` file and parses the command line.
    ///
    /// The file named by `DOCQA_ENV_FILE` (or `.env`) is loaded before
    /// parsing so its variables act as flag fallbacks. If `--env-file` names
    /// another file, that file is loaded and the command line parsed again.
    pub fn init() -> Self {
        let initial = SourceConfig::from_env().env_file;
        load_env_file(&initial);

        let cli = Self::parse();
        if cli.sources.env_file == initial {
            return cli;
        }

        load_env_file(&cli.sources.env_file);
        Self::parse()
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;

        if self.service.session_ttl == 0 {
            anyhow::bail!("session TTL must be at least one second");
        }

        Ok(())
    }

    /// Logs the configuration. Secrets are never part of it.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            "Build information"
        );

        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            session_ttl_secs = self.service.session_ttl,
            secrets_file = %self.sources.secrets_file.display(),
            env_file = %self.sources.env_file.display(),
            "Service configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "docqa",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--request-timeout",
            "120",
            "--shutdown-timeout",
            "10",
            "--cors-origins",
            "https://a.example.com,https://b.example.com",
            "--secrets-file",
            "conf/secrets.toml",
            "--env-file",
            "conf/.env",
        ])?;

        assert_eq!(cli.server.port, 8080);
        assert!(cli.server.binds_to_all_interfaces());
        assert_eq!(cli.middleware.recovery.request_timeout, 120);
        assert_eq!(cli.server.shutdown_timeout, 10);
        assert_eq!(cli.middleware.cors.allowed_origins.len(), 2);
        assert_eq!(cli.sources.secrets_file.to_str(), Some("conf/secrets.toml"));
        assert_eq!(cli.sources.env_file.to_str(), Some("conf/.env"));
        cli.validate()
    }

    #[test]
    fn rejects_zero_session_ttl() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["docqa", "--session-ttl", "0"])?;
        assert!(cli.validate().is_err());
        Ok(())
    }
}
