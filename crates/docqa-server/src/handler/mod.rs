//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod chat;
mod error;
mod frontend;
mod index;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::middleware::resolve_session;
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Fails with [`ErrorKind::MissingCredentials`] listing `missing` keys.
pub(crate) fn require_credentials(missing: &[String]) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }

    Err(ErrorKind::MissingCredentials
        .with_message(format!("Missing: {}", missing.join(", ")))
        .with_context("Set them in the environment, a .env file or secrets.toml"))
}

/// Returns the application [`Router`] with every route and its state.
pub fn routes(state: ServiceState) -> Router {
    let session = from_fn_with_state(state.clone(), resolve_session);

    Router::new()
        .merge(frontend::routes())
        .merge(monitors::routes())
        .merge(index::routes())
        .merge(chat::routes())
        .route_layer(session)
        .fallback(fallback)
        .with_state(state)
}
