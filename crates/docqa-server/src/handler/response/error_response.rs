use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// HTTP error response body.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier
    pub name: Cow<'a, str>,
    /// User-friendly error message safe for client display
    pub message: Cow<'a, str>,
    /// Additional detail about what went wrong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip, default = "default_status")]
    pub status: StatusCode,
}

fn default_status() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const CHATBOT_NOT_INITIALIZED: Self = Self::new(
        "chatbot_not_initialized",
        "Initialize the chatbot before asking questions",
        StatusCode::CONFLICT,
    );
    pub const DOCUMENT_LOAD: Self = Self::new(
        "document_load_failed",
        "The documents could not be loaded",
        StatusCode::UNPROCESSABLE_ENTITY,
    );
    pub const INDEX_NOT_FOUND: Self = Self::new(
        "index_not_found",
        "The vector index does not exist. Create it first",
        StatusCode::NOT_FOUND,
    );
    pub const MISSING_CREDENTIALS: Self = Self::new(
        "missing_credentials",
        "Required API keys are not configured",
        StatusCode::PRECONDITION_FAILED,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    // 5xx Server Errors
    pub const CONFIGURATION: Self = Self::new(
        "configuration_error",
        "The server configuration is invalid",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const UPSTREAM: Self = Self::new(
        "upstream_error",
        "An embedding, index or language model service failed",
        StatusCode::BAD_GATEWAY,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            context: None,
            status,
        }
    }

    /// Appends `message` to the existing message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        let new_message = message.into();
        self.message = Cow::Owned(format!("{}. {}", self.message, new_message));
        self
    }

    /// Attaches context, merging with any existing context.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_merging_message() {
        let response = ErrorResponse::MISSING_CREDENTIALS.with_message("Missing: OPENAI_API_KEY");

        assert_eq!(
            &response.message,
            "Required API keys are not configured. Missing: OPENAI_API_KEY"
        );
    }

    #[test]
    fn error_response_merging_context() {
        let response = ErrorResponse::UPSTREAM
            .with_context("stage: embedded")
            .with_context("huggingface returned 503");

        assert_eq!(
            response.context.as_deref(),
            Some("stage: embedded; huggingface returned 503")
        );
    }

    #[test]
    fn error_response_serialization() -> anyhow::Result<()> {
        let json = serde_json::to_value(ErrorResponse::INDEX_NOT_FOUND)?;

        assert_eq!(json["name"], "index_not_found");
        assert!(json.get("context").is_none());
        assert!(json.get("status").is_none());
        Ok(())
    }
}
