//! Lazily checked completion model.

use std::sync::Arc;

use docqa_core::config::{Settings, keys};
use docqa_core::{Error, Generator, Result};

use crate::provider::CompletionProvider;

/// The completion model, or the credential that is missing for it.
///
/// Answering against a missing slot fails with a `Config` error before any
/// network call.
#[derive(Clone)]
pub enum GeneratorSlot {
    /// A usable model.
    Ready(Arc<dyn Generator>),
    /// No model; names the absent credential.
    Missing(String),
}

impl GeneratorSlot {
    /// Wraps a concrete generator.
    pub fn ready(generator: impl Generator + 'static) -> Self {
        Self::Ready(Arc::new(generator))
    }

    /// Builds the OpenAI provider, or records the missing key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.credentials.openai_api_key.is_none() {
            return Ok(Self::Missing(keys::OPENAI_API_KEY.to_owned()));
        }

        Ok(Self::ready(CompletionProvider::from_settings(settings)?))
    }

    /// Returns the generator or a `Config` error naming the missing key.
    pub fn require(&self) -> Result<&Arc<dyn Generator>> {
        match self {
            Self::Ready(generator) => Ok(generator),
            Self::Missing(key) => Err(Error::config(format!("{key} is not configured"))),
        }
    }

    /// Returns true if a model is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for GeneratorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(generator) => f
                .debug_tuple("GeneratorSlot::Ready")
                .field(&generator.model_name())
                .finish(),
            Self::Missing(key) => f.debug_tuple("GeneratorSlot::Missing").field(key).finish(),
        }
    }
}
