//! Middleware for `axum::Router`.
//!
//! ```rust,ignore
//! use docqa_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt,
//!     RouterSecurityExt,
//! };
//!
//! let app = routes(state)
//!     .with_security(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;
mod security;
mod session;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt, create_cors_layer};
pub use session::resolve_session;
