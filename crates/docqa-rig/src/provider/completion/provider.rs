//! Completion provider abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::config::{Settings, keys};
use docqa_core::{Error, Generator, Result};
use rig::completion::{AssistantContent, CompletionModel as RigCompletionModel};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::openai;

use crate::TRACING_TARGET;

/// Completion provider that wraps the supported chat models.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
        temperature: f64,
    },
}

impl CompletionProvider {
    /// Creates an OpenAI chat completion provider.
    pub fn openai(api_key: &str, model: &str, temperature: f64) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::config(format!("cannot create openai client: {e}")))?
            .completions_api();

        Ok(Self(Arc::new(CompletionService::OpenAi {
            model: client.completion_model(model),
            model_name: model.to_owned(),
            temperature,
        })))
    }

    /// Creates the provider from resolved settings.
    ///
    /// Fails with a `Config` error naming `OPENAI_API_KEY` when it is absent.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .credentials
            .openai_api_key
            .as_deref()
            .ok_or_else(|| Error::config(format!("{} is not configured", keys::OPENAI_API_KEY)))?;

        let provider = Self::openai(api_key, &settings.llm.model, settings.llm.temperature)?;
        tracing::info!(
            target: TRACING_TARGET,
            provider = provider.provider_name(),
            model = provider.model_name(),
            temperature = provider.temperature(),
            "Completion provider configured"
        );

        Ok(provider)
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            CompletionService::OpenAi { .. } => "openai",
        }
    }
}

#[async_trait]
impl Generator for CompletionProvider {
    fn model_name(&self) -> &str {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => model_name,
        }
    }

    fn temperature(&self) -> f64 {
        match self.0.as_ref() {
            CompletionService::OpenAi { temperature, .. } => *temperature,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.0.as_ref() {
            CompletionService::OpenAi {
                model,
                model_name,
                temperature,
            } => model
                .completion_request(prompt)
                .temperature(*temperature)
                .send()
                .await
                .map(|r| extract_text_content(&r.choice))
                .map_err(|e| Error::generation(format!("{model_name}: {e}"))),
        }
    }
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            CompletionService::OpenAi {
                model_name,
                temperature,
                ..
            } => f
                .debug_struct("CompletionProvider::OpenAi")
                .field("model", model_name)
                .field("temperature", temperature)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error() {
        let err = CompletionProvider::from_settings(&Settings::default()).unwrap_err();
        assert_eq!(err.kind(), docqa_core::ErrorKind::Config);
        assert!(err.to_string().contains(keys::OPENAI_API_KEY));
    }

    #[test]
    fn uses_configured_model_and_temperature() -> anyhow::Result<()> {
        let mut settings = Settings::default();
        settings.credentials.openai_api_key = Some("sk-test".to_owned());

        let provider = CompletionProvider::from_settings(&settings)?;
        assert_eq!(provider.model_name(), "gpt-3.5-turbo");
        assert_eq!(provider.temperature(), 0.1);
        assert!(!format!("{provider:?}").contains("sk-test"));
        Ok(())
    }
}
