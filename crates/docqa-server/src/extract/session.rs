//! Session extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::handler::{Error, ErrorKind};
use crate::service::SessionContext;

/// The caller's session.
///
/// Requires the session middleware on the route; without it extraction fails
/// with an internal error.
#[derive(Debug, Clone)]
pub struct Session(pub SessionContext);

impl std::ops::Deref for Session {
    type Target = SessionContext;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(Self)
            .ok_or_else(|| {
                ErrorKind::InternalServerError
                    .with_message("Session unavailable")
                    .with_context("session middleware is not installed on this route")
            })
    }
}
