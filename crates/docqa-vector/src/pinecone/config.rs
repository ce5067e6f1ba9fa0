//! Pinecone configuration.

use std::fmt;
use std::time::Duration;

use derive_builder::Builder;

/// Default control plane endpoint.
pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";

/// REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "2024-07";

/// Pinecone configuration.
#[derive(Clone, PartialEq, Builder)]
#[builder(
    name = "PineconeBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct PineconeConfig {
    /// Pinecone API key.
    pub api_key: String,
    /// Serverless cloud provider, e.g. `aws`.
    #[builder(default = "\"aws\".to_owned()")]
    pub cloud: String,
    /// Serverless region, e.g. `us-east-1`.
    #[builder(default = "\"us-east-1\".to_owned()")]
    pub region: String,
    /// Namespace used for all data plane requests.
    #[builder(default)]
    pub namespace: Option<String>,
    /// Control plane base URL.
    #[builder(default = "DEFAULT_CONTROLLER_URL.to_owned()")]
    pub controller_url: String,
    /// Value of the `X-Pinecone-API-Version` header.
    #[builder(default = "DEFAULT_API_VERSION.to_owned()")]
    pub api_version: String,
    /// How long to wait for a new index to become ready.
    #[builder(default = "Duration::from_secs(120)")]
    pub ready_timeout: Duration,
    /// Delay between readiness checks.
    #[builder(default = "Duration::from_secs(1)")]
    pub poll_interval: Duration,
}

impl PineconeConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PineconeBuilder {
        PineconeBuilder::default()
    }
}

impl PineconeBuilder {
    fn validate_config(&self) -> Result<(), String> {
        if let Some(api_key) = &self.api_key
            && api_key.trim().is_empty()
        {
            return Err("API key must not be empty".to_owned());
        }

        if let Some(url) = &self.controller_url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(format!("controller URL '{url}' must be http(s)"));
        }

        if let Some(poll_interval) = &self.poll_interval
            && poll_interval.is_zero()
        {
            return Err("poll interval must be greater than 0".to_owned());
        }

        Ok(())
    }
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("namespace", &self.namespace)
            .field("controller_url", &self.controller_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() -> anyhow::Result<()> {
        let config = PineconeConfig::builder().with_api_key("pc-key").build()?;

        assert_eq!(config.cloud, "aws");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.controller_url, DEFAULT_CONTROLLER_URL);
        assert_eq!(config.namespace, None);
        Ok(())
    }

    #[test]
    fn builder_requires_api_key() {
        assert!(PineconeConfig::builder().build().is_err());
        assert!(PineconeConfig::builder().with_api_key("  ").build().is_err());
    }

    #[test]
    fn debug_hides_api_key() -> anyhow::Result<()> {
        let config = PineconeConfig::builder()
            .with_api_key("pc-secret")
            .with_namespace("docs")
            .build()?;

        assert!(!format!("{config:?}").contains("pc-secret"));
        Ok(())
    }
}
