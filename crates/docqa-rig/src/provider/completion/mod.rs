//! Completion providers.

mod provider;

pub use provider::CompletionProvider;
