//! Conversion of pipeline errors into HTTP errors.

use docqa_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error, ErrorKind};
use crate::TRACING_TARGET_HANDLER;

impl From<docqa_core::Error> for Error<'static> {
    fn from(error: docqa_core::Error) -> Self {
        let kind = match error.kind() {
            CoreErrorKind::InvalidInput => ErrorKind::BadRequest,
            CoreErrorKind::IndexNotFound => ErrorKind::IndexNotFound,
            CoreErrorKind::Load => ErrorKind::DocumentLoad,
            CoreErrorKind::Config => ErrorKind::Configuration,
            CoreErrorKind::Embedding | CoreErrorKind::Index | CoreErrorKind::Generation => {
                ErrorKind::Upstream
            }
        };

        if kind.status_code().is_server_error() {
            tracing::error!(
                target: TRACING_TARGET_HANDLER,
                kind = error.kind_str(),
                error = %error,
                "Request failed"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_HANDLER,
                kind = error.kind_str(),
                error = %error,
                "Request rejected"
            );
        }

        let mut http = Error::new(kind);
        if let Some(message) = error.message() {
            http = http.with_message(message.to_owned());
        }
        if let Some(context) = error.context() {
            http = http.with_context(context.to_owned());
        }

        http
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn maps_kinds_to_statuses() {
        let cases = [
            (docqa_core::Error::invalid_input("blank"), StatusCode::BAD_REQUEST),
            (docqa_core::Error::index_not_found("kb"), StatusCode::NOT_FOUND),
            (docqa_core::Error::load("no pdfs"), StatusCode::UNPROCESSABLE_ENTITY),
            (docqa_core::Error::embedding("down"), StatusCode::BAD_GATEWAY),
            (docqa_core::Error::config("bad"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (core, status) in cases {
            let error = Error::from(core);
            assert_eq!(error.kind().status_code(), status);
        }
    }

    #[test]
    fn keeps_message_and_context() {
        let core = docqa_core::Error::generation("timeout").with_context("stage: generated");
        let error = Error::from(core);

        assert_eq!(error.kind(), ErrorKind::Upstream);
        assert_eq!(error.message(), Some("timeout"));
        assert_eq!(error.context(), Some("stage: generated"));
    }
}
