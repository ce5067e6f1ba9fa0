//! Application state, configuration and sessions.

mod config;
mod session;
mod state;

pub use config::ServiceConfig;
pub use session::{
    ChatMessage, DEFAULT_SESSION_TTL, Role, SESSION_COOKIE, SessionContext, SessionData,
    SessionStore,
};
pub use state::{ServiceState, Uptime};
