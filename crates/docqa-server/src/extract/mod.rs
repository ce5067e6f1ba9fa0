//! Request extractors with error responses in the server's format.
//!
//! - [`Json`] replaces [`axum::Json`] and rejects malformed bodies with a
//!   `400` in the [`ErrorResponse`] shape.
//! - [`Session`] hands out the session resolved by the session middleware.
//!
//! [`ErrorResponse`]: crate::handler::response::ErrorResponse

mod json;
mod session;

pub use json::Json;
pub use session::Session;
