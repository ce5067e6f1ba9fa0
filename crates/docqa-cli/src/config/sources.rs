//! Locations of the `.env` and secrets files.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use docqa_core::config::{Resolver, Settings};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Default secrets file, relative to the working directory.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Default dotenv file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

const SECRETS_FILE_VAR: &str = "DOCQA_SECRETS_FILE";
const ENV_FILE_VAR: &str = "DOCQA_ENV_FILE";

/// Where pipeline settings are read from.
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct SourceConfig {
    /// TOML file with `KEY = "value"` secrets; takes precedence over the
    /// environment. A missing file is ignored.
    #[arg(long, env = "DOCQA_SECRETS_FILE", default_value = "secrets.toml")]
    pub secrets_file: PathBuf,

    /// Dotenv file loaded into the environment at startup. A missing file
    /// is ignored.
    #[arg(long, env = "DOCQA_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            secrets_file: PathBuf::from(DEFAULT_SECRETS_FILE),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
        }
    }
}

impl SourceConfig {
    /// Reads the locations from the environment only.
    pub fn from_env() -> Self {
        let path = |var: &str, default: &str| {
            env::var_os(var)
                .filter(|value| !value.is_empty())
                .map_or_else(|| PathBuf::from(default), PathBuf::from)
        };

        Self {
            secrets_file: path(SECRETS_FILE_VAR, DEFAULT_SECRETS_FILE),
            env_file: path(ENV_FILE_VAR, DEFAULT_ENV_FILE),
        }
    }

    /// Resolves and validates pipeline settings.
    pub fn resolve_settings(&self) -> anyhow::Result<Settings> {
        let resolver = Resolver::standard(&self.secrets_file).with_context(|| {
            format!(
                "failed to read secrets file '{}'",
                self.secrets_file.display()
            )
        })?;

        let settings = Settings::resolve(&resolver).context("invalid pipeline settings")?;
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            secrets_file = %self.secrets_file.display(),
            backend = %settings.index.backend,
            index = %settings.index.name,
            "Pipeline settings resolved"
        );
        Ok(settings)
    }
}

/// Loads `path` into the process environment without overriding variables
/// that are already set. A missing file is not an error.
pub fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => {}
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("Warning: failed to load {}: {err}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use docqa_core::config::VectorBackendKind;

    use super::*;

    #[test]
    fn secrets_file_settings_are_resolved() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let secrets = dir.path().join("secrets.toml");
        fs::write(
            &secrets,
            "VECTOR_BACKEND = \"memory\"\nPINECONE_INDEX_NAME = \"handbook\"\n",
        )?;

        let config = SourceConfig {
            secrets_file: secrets,
            ..SourceConfig::default()
        };
        let settings = config.resolve_settings()?;

        assert_eq!(settings.index.backend, VectorBackendKind::Memory);
        assert_eq!(settings.index.name, "handbook");
        Ok(())
    }

    #[test]
    fn missing_env_file_is_ignored() {
        load_env_file(Path::new("/nonexistent/docqa/.env"));
    }
}
