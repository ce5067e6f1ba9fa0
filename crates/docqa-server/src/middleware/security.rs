//! Cross-origin resource sharing.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// Origins allowed when none are configured.
const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:8501",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8501",
];

/// CORS configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// Allowed origins. Empty means localhost only.
    #[cfg_attr(
        feature = "config",
        arg(long = "cors-origins", env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "cors-max-age", env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,

    /// Whether cross-origin requests may carry the session cookie.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cors-allow-credentials",
            env = "CORS_ALLOW_CREDENTIALS",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Returns the preflight cache lifetime.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Converts the configured origins, skipping unparsable ones.
    pub fn to_header_values(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            LOCALHOST_ORIGINS
                .iter()
                .map(|origin| HeaderValue::from_static(origin))
                .collect()
        } else {
            self.allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect()
        }
    }
}

/// Creates a CORS layer for the configuration.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.to_header_values())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(config.allow_credentials)
        .max_age(config.max_age())
}

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers CORS with the given configuration.
    fn with_security(self, cors: &CorsConfig) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig) -> Self {
        self.layer(create_cors_layer(cors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_origins_by_default() {
        let origins = CorsConfig::default().to_header_values();
        assert_eq!(origins.len(), LOCALHOST_ORIGINS.len());
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://docs.example.com".to_owned(),
                "bad\norigin".to_owned(),
            ],
            ..Default::default()
        };
        assert_eq!(config.to_header_values().len(), 1);
    }
}
