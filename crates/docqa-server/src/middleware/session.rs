//! Session cookie handling.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::TRACING_TARGET_SESSION;
use crate::service::{SESSION_COOKIE, SessionStore};

/// Resolves the caller's session and stores it in the request extensions.
///
/// Unknown, expired or malformed cookies start a new session, and the
/// response then sets a fresh [`SESSION_COOKIE`].
pub async fn resolve_session(
    State(sessions): State<SessionStore>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    let (session, created) = sessions.resolve(requested).await;
    let id = session.id();
    request.extensions_mut().insert(session);

    let response = next.run(request).await;
    if !created {
        return response;
    }

    tracing::trace!(
        target: TRACING_TARGET_SESSION,
        session = %id,
        "Setting session cookie"
    );

    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), response).into_response()
}
