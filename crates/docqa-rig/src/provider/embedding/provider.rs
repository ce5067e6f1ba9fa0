//! Embedding provider abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::config::{EmbeddingProviderKind, Settings, keys};
use docqa_core::emb::check_dimensions;
use docqa_core::{Embedder, Error, Result};
use rig::client::Nothing;
use rig::embeddings::{Embedding, EmbeddingModel as RigEmbeddingModel};
use rig::prelude::EmbeddingsClient;
use rig::providers::{ollama, openai};

use super::HuggingFaceEmbedder;
use crate::TRACING_TARGET;

/// Embedding provider that wraps the supported hosted models.
///
/// This is a cheaply cloneable wrapper around an `Arc<EmbeddingService>`.
#[derive(Clone)]
pub struct EmbeddingProvider(Arc<EmbeddingService>);

enum EmbeddingService {
    HuggingFace {
        client: HuggingFaceEmbedder,
        ndims: usize,
    },
    OpenAi {
        model: openai::EmbeddingModel,
        model_name: String,
    },
    Ollama {
        client: ollama::Client,
        model_name: String,
        ndims: usize,
    },
}

impl EmbeddingProvider {
    /// Creates a Hugging Face Inference API provider.
    pub fn huggingface(
        base_url: &str,
        model: &str,
        ndims: usize,
        token: Option<String>,
    ) -> Result<Self> {
        let client = HuggingFaceEmbedder::new(base_url, model, token)?;
        Ok(Self(Arc::new(EmbeddingService::HuggingFace { client, ndims })))
    }

    /// Creates an OpenAI embedding provider.
    pub fn openai(api_key: &str, model: &str, ndims: usize) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::config(format!("cannot create openai client: {e}")))?;

        Ok(Self(Arc::new(EmbeddingService::OpenAi {
            model: client.embedding_model_with_ndims(model, ndims),
            model_name: model.to_owned(),
        })))
    }

    /// Creates an Ollama embedding provider.
    pub fn ollama(base_url: &str, model: &str, ndims: usize) -> Result<Self> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| Error::config(format!("cannot create ollama client: {e}")))?;

        Ok(Self(Arc::new(EmbeddingService::Ollama {
            client,
            model_name: model.to_owned(),
            ndims,
        })))
    }

    /// Creates the provider selected by `EMBEDDING_PROVIDER`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedding = &settings.embedding;
        let provider = match embedding.provider {
            EmbeddingProviderKind::HuggingFace => Self::huggingface(
                &embedding.huggingface_base_url,
                &embedding.model,
                embedding.dimensions,
                settings.credentials.huggingface_api_key.clone(),
            )?,
            EmbeddingProviderKind::OpenAi => {
                let api_key = settings.credentials.openai_api_key.as_deref().ok_or_else(|| {
                    Error::config(format!(
                        "{} is required for openai embeddings",
                        keys::OPENAI_API_KEY
                    ))
                })?;
                Self::openai(api_key, &embedding.model, embedding.dimensions)?
            }
            EmbeddingProviderKind::Ollama => Self::ollama(
                &embedding.ollama_base_url,
                &embedding.model,
                embedding.dimensions,
            )?,
        };

        tracing::info!(
            target: TRACING_TARGET,
            provider = provider.provider_name(),
            model = provider.model_name(),
            ndims = provider.ndims(),
            "Embedding provider configured"
        );

        Ok(provider)
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            EmbeddingService::HuggingFace { .. } => "huggingface",
            EmbeddingService::OpenAi { .. } => "openai",
            EmbeddingService::Ollama { .. } => "ollama",
        }
    }

    async fn embed_with_rig(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        let result = match self.0.as_ref() {
            EmbeddingService::OpenAi { model, .. } => model.embed_texts(texts).await,
            EmbeddingService::Ollama {
                client,
                model_name,
                ndims,
            } => {
                let model = ollama::EmbeddingModel::new(client.clone(), model_name, *ndims);
                model.embed_texts(texts).await
            }
            EmbeddingService::HuggingFace { .. } => {
                return Err(Error::embedding("huggingface is not served through rig"));
            }
        };

        result.map_err(|e| Error::embedding(format!("{}: {e}", self.provider_name())))
    }
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    fn model_name(&self) -> &str {
        match self.0.as_ref() {
            EmbeddingService::HuggingFace { client, .. } => client.model_name(),
            EmbeddingService::OpenAi { model_name, .. } => model_name,
            EmbeddingService::Ollama { model_name, .. } => model_name,
        }
    }

    fn ndims(&self) -> usize {
        match self.0.as_ref() {
            EmbeddingService::HuggingFace { ndims, .. } => *ndims,
            EmbeddingService::OpenAi { model, .. } => model.ndims(),
            EmbeddingService::Ollama { ndims, .. } => *ndims,
        }
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let vectors = match self.0.as_ref() {
            EmbeddingService::HuggingFace { client, .. } => client.embed(&texts).await?,
            _ => self
                .embed_with_rig(texts)
                .await?
                .into_iter()
                .map(|embedding| embedding.vec.into_iter().map(|v| v as f32).collect())
                .collect(),
        };

        if vectors.len() != expected {
            return Err(Error::embedding(format!(
                "{} returned {} vectors for {expected} texts",
                self.provider_name(),
                vectors.len()
            )));
        }
        check_dimensions(self.ndims(), &vectors)?;

        Ok(vectors)
    }
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            EmbeddingService::HuggingFace { client, ndims } => f
                .debug_struct("EmbeddingProvider::HuggingFace")
                .field("model", &client.model_name())
                .field("ndims", ndims)
                .finish(),
            EmbeddingService::OpenAi { model, model_name } => f
                .debug_struct("EmbeddingProvider::OpenAi")
                .field("model", model_name)
                .field("ndims", &model.ndims())
                .finish(),
            EmbeddingService::Ollama {
                model_name, ndims, ..
            } => f
                .debug_struct("EmbeddingProvider::Ollama")
                .field("model", model_name)
                .field("ndims", ndims)
                .finish(),
        }
    }
}
