//! Service configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::DEFAULT_SESSION_TTL;

/// Settings of the HTTP service itself.
///
/// Pipeline settings (credentials, index, models) are resolved separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Idle time in seconds after which a browser session is discarded.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SESSION_TTL", default_value = "7200")
    )]
    pub session_ttl: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL.as_secs(),
        }
    }
}

impl ServiceConfig {
    /// Returns the session idle timeout.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}
