//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while ingesting documents or
/// answering questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A credential is missing or a setting is invalid.
    Config,
    /// The document directory or a document could not be read.
    Load,
    /// The embedding model failed or returned malformed vectors.
    Embedding,
    /// The vector index rejected or failed a request.
    Index,
    /// The named vector index does not exist.
    IndexNotFound,
    /// The language model failed to produce a completion.
    Generation,
    /// Caller supplied arguments outside their valid range.
    InvalidInput,
}

/// A structured error type shared by every docqa crate.
#[derive(Debug, Error)]
#[error(
    "{kind:?}{}{}",
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default(),
    context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional context, e.g. the pipeline stage that failed.
    pub context: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds context to this error, keeping any context already attached.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = Some(match self.context.take() {
            Some(existing) => format!("{existing}; {context}"),
            None => context,
        });
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config).with_message(message)
    }

    /// Creates a new document loading error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load).with_message(message)
    }

    /// Creates a new embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Embedding).with_message(message)
    }

    /// Creates a new vector index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index).with_message(message)
    }

    /// Creates a new missing index error.
    pub fn index_not_found(name: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::IndexNotFound)
            .with_message(format!("index '{}' does not exist", name.as_ref()))
    }

    /// Creates a new generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generation).with_message(message)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput).with_message(message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the attached context, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_context() {
        let error = Error::embedding("model unavailable").with_context("stage: embedded");
        assert_eq!(
            error.to_string(),
            "Embedding: model unavailable (stage: embedded)"
        );
    }

    #[test]
    fn context_is_merged() {
        let error = Error::index("timeout")
            .with_context("upsert")
            .with_context("batch 2");
        assert_eq!(error.context(), Some("upsert; batch 2"));
    }

    #[test]
    fn kind_str_is_snake_case() {
        assert_eq!(Error::index_not_found("kb").kind_str(), "index_not_found");
        assert_eq!(Error::config("missing").kind_str(), "config");
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("disk");
        let error = Error::load("unreadable").with_source(io);
        assert!(std::error::Error::source(&error).is_some());
    }
}
