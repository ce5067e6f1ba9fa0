//! Resolved pipeline settings.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::keys;
use super::source::Resolver;
use crate::{Error, Result, TRACING_TARGET_CONFIG};

/// Default vector index name.
pub const DEFAULT_INDEX_NAME: &str = "medical-knowledge-base";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
/// Default embedding dimensionality.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default chunk overlap in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;
/// Default completion model.
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
/// Default sampling temperature.
pub const DEFAULT_LLM_TEMPERATURE: f64 = 0.1;
/// Default number of retrieved chunks.
pub const DEFAULT_RETRIEVER_K: usize = 3;
/// Default PDF directory.
pub const DEFAULT_PDF_DATA_PATH: &str = "./";

/// Hosted vector database backing the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackendKind {
    /// Pinecone serverless index.
    #[default]
    Pinecone,
    /// Process-local index, lost on exit.
    Memory,
}

/// Hosted embedding model family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Hugging Face inference feature-extraction endpoint.
    #[default]
    HuggingFace,
    /// OpenAI embeddings API.
    OpenAi,
    /// Ollama server.
    Ollama,
}

/// Chunk boundary strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Fixed character window with exact overlap.
    #[default]
    Window,
    /// Sentence and word aware boundaries.
    Semantic,
}

/// API credentials. `Debug` never prints the values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Pinecone API key.
    pub pinecone_api_key: Option<String>,
    /// OpenAI API key.
    pub openai_api_key: Option<String>,
    /// Optional Hugging Face token for the hosted embedder.
    pub huggingface_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("huggingface_api_key", &redact(&self.huggingface_api_key))
            .finish()
    }
}

/// Presence of one required credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    /// Environment/secrets key name.
    pub name: String,
    /// Whether a non-blank value was resolved.
    pub configured: bool,
}

/// Vector index settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub backend: VectorBackendKind,
    pub name: String,
    pub cloud: String,
    pub region: String,
    pub namespace: Option<String>,
    pub controller_url: String,
}

/// Embedding model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub dimensions: usize,
    pub huggingface_base_url: String,
    pub ollama_base_url: String,
}

/// Chunking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
    pub strategy: ChunkStrategy,
}

/// Completion model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f64,
}

/// Document source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
    pub data_path: PathBuf,
    pub recursive: bool,
}

/// Every tunable the pipeline reads, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub credentials: Credentials,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub llm: LlmSettings,
    pub retriever_k: usize,
    pub documents: DocumentSettings,
}

impl Settings {
    /// Resolves and validates settings from `resolver`.
    ///
    /// Missing credentials are not an error here; they are reported through
    /// [`Settings::credentials`] and checked by the operations needing them.
    pub fn resolve(resolver: &Resolver) -> Result<Self> {
        let settings = Self {
            credentials: Credentials {
                pinecone_api_key: resolver.get(keys::PINECONE_API_KEY),
                openai_api_key: resolver.get(keys::OPENAI_API_KEY),
                huggingface_api_key: resolver.get(keys::HUGGINGFACE_API_KEY),
            },
            index: IndexSettings {
                backend: resolver.parse(keys::VECTOR_BACKEND, VectorBackendKind::default())?,
                name: resolver.get_or(keys::PINECONE_INDEX_NAME, DEFAULT_INDEX_NAME),
                cloud: resolver.get_or(keys::PINECONE_CLOUD, "aws"),
                region: resolver.get_or(keys::PINECONE_REGION, "us-east-1"),
                namespace: resolver.get(keys::PINECONE_NAMESPACE),
                controller_url: resolver
                    .get_or(keys::PINECONE_CONTROLLER_URL, "https://api.pinecone.io"),
            },
            embedding: EmbeddingSettings {
                provider: resolver
                    .parse(keys::EMBEDDING_PROVIDER, EmbeddingProviderKind::default())?,
                model: resolver.get_or(keys::EMBEDDING_MODEL_NAME, DEFAULT_EMBEDDING_MODEL),
                dimensions: resolver
                    .parse(keys::EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_DIMENSIONS)?,
                huggingface_base_url: resolver.get_or(
                    keys::HUGGINGFACE_BASE_URL,
                    "https://router.huggingface.co/hf-inference",
                ),
                ollama_base_url: resolver.get_or(keys::OLLAMA_BASE_URL, "http://localhost:11434"),
            },
            chunking: ChunkingSettings {
                size: resolver.parse(keys::CHUNK_SIZE, DEFAULT_CHUNK_SIZE)?,
                overlap: resolver.parse(keys::CHUNK_OVERLAP, DEFAULT_CHUNK_OVERLAP)?,
                strategy: resolver.parse(keys::CHUNK_STRATEGY, ChunkStrategy::default())?,
            },
            llm: LlmSettings {
                model: resolver.get_or(keys::LLM_MODEL, DEFAULT_LLM_MODEL),
                temperature: resolver.parse(keys::LLM_TEMPERATURE, DEFAULT_LLM_TEMPERATURE)?,
            },
            retriever_k: resolver.parse(keys::RETRIEVER_K, DEFAULT_RETRIEVER_K)?,
            documents: DocumentSettings {
                data_path: PathBuf::from(resolver.get_or(keys::PDF_DATA_PATH, DEFAULT_PDF_DATA_PATH)),
                recursive: resolver.parse(keys::PDF_RECURSIVE, false)?,
            },
        };

        settings.validate()?;

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            index = %settings.index.name,
            backend = %settings.index.backend,
            embedding_provider = %settings.embedding.provider,
            embedding_model = %settings.embedding.model,
            chunk_size = settings.chunking.size,
            chunk_overlap = settings.chunking.overlap,
            llm_model = %settings.llm.model,
            retriever_k = settings.retriever_k,
            "Settings resolved"
        );

        Ok(settings)
    }

    /// Checks value ranges and cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 {
            return Err(Error::config("CHUNK_SIZE must be greater than 0"));
        }

        if self.chunking.overlap >= self.chunking.size {
            return Err(Error::config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunking.overlap, self.chunking.size
            )));
        }

        if self.retriever_k == 0 {
            return Err(Error::config("RETRIEVER_K must be at least 1"));
        }

        if self.embedding.dimensions == 0 {
            return Err(Error::config("EMBEDDING_DIMENSIONS must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "LLM_TEMPERATURE ({}) must be between 0.0 and 2.0",
                self.llm.temperature
            )));
        }

        if self.index.name.trim().is_empty() {
            return Err(Error::config("PINECONE_INDEX_NAME must not be empty"));
        }

        Ok(())
    }

    /// Reports presence of the credentials the pipeline requires.
    pub fn credentials(&self) -> Vec<CredentialStatus> {
        let status = |name: &str, value: &Option<String>| CredentialStatus {
            name: name.to_owned(),
            configured: value.is_some(),
        };

        vec![
            status(keys::PINECONE_API_KEY, &self.credentials.pinecone_api_key),
            status(keys::OPENAI_API_KEY, &self.credentials.openai_api_key),
        ]
    }

    /// Returns the names of required credentials that are not configured.
    ///
    /// The Pinecone key is not required when the in-memory backend is used.
    pub fn missing_credentials(&self) -> Vec<String> {
        self.credentials()
            .into_iter()
            .filter(|status| !status.configured)
            .filter(|status| {
                status.name != keys::PINECONE_API_KEY
                    || self.index.backend == VectorBackendKind::Pinecone
            })
            .map(|status| status.name)
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            index: IndexSettings {
                backend: VectorBackendKind::default(),
                name: DEFAULT_INDEX_NAME.to_owned(),
                cloud: "aws".to_owned(),
                region: "us-east-1".to_owned(),
                namespace: None,
                controller_url: "https://api.pinecone.io".to_owned(),
            },
            embedding: EmbeddingSettings {
                provider: EmbeddingProviderKind::default(),
                model: DEFAULT_EMBEDDING_MODEL.to_owned(),
                dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
                huggingface_base_url: "https://router.huggingface.co/hf-inference".to_owned(),
                ollama_base_url: "http://localhost:11434".to_owned(),
            },
            chunking: ChunkingSettings {
                size: DEFAULT_CHUNK_SIZE,
                overlap: DEFAULT_CHUNK_OVERLAP,
                strategy: ChunkStrategy::default(),
            },
            llm: LlmSettings {
                model: DEFAULT_LLM_MODEL.to_owned(),
                temperature: DEFAULT_LLM_TEMPERATURE,
            },
            retriever_k: DEFAULT_RETRIEVER_K,
            documents: DocumentSettings {
                data_path: PathBuf::from(DEFAULT_PDF_DATA_PATH),
                recursive: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSource;
    use crate::ErrorKind;

    fn resolve(pairs: &[(&str, &str)]) -> Result<Settings> {
        let layer: MapSource = pairs.iter().copied().collect();
        Settings::resolve(&Resolver::new().with_layer(layer))
    }

    #[test]
    fn defaults_match_empty_resolver() -> anyhow::Result<()> {
        let settings = resolve(&[])?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chunking.size, 500);
        assert_eq!(settings.chunking.overlap, 20);
        assert_eq!(settings.retriever_k, 3);
        assert_eq!(settings.embedding.dimensions, 384);
        assert_eq!(settings.llm.model, "gpt-3.5-turbo");
        Ok(())
    }

    #[test]
    fn overrides_are_parsed() -> anyhow::Result<()> {
        let settings = resolve(&[
            ("CHUNK_SIZE", "800"),
            ("CHUNK_OVERLAP", "100"),
            ("CHUNK_STRATEGY", "Semantic"),
            ("EMBEDDING_PROVIDER", "openai"),
            ("VECTOR_BACKEND", "memory"),
            ("PDF_RECURSIVE", "true"),
        ])?;

        assert_eq!(settings.chunking.size, 800);
        assert_eq!(settings.chunking.overlap, 100);
        assert_eq!(settings.chunking.strategy, ChunkStrategy::Semantic);
        assert_eq!(settings.embedding.provider, EmbeddingProviderKind::OpenAi);
        assert_eq!(settings.index.backend, VectorBackendKind::Memory);
        assert!(settings.documents.recursive);
        Ok(())
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let error = resolve(&[("CHUNK_SIZE", "20"), ("CHUNK_OVERLAP", "20")]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(resolve(&[("RETRIEVER_K", "0")]).is_err());
    }

    #[test]
    fn temperature_range_is_checked() {
        assert!(resolve(&[("LLM_TEMPERATURE", "2.5")]).is_err());
        assert!(resolve(&[("LLM_TEMPERATURE", "0")]).is_ok());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = resolve(&[("EMBEDDING_PROVIDER", "word2vec")]).unwrap_err();
        assert!(error.to_string().contains("EMBEDDING_PROVIDER"));
    }

    #[test]
    fn credentials_are_reported_not_exposed() -> anyhow::Result<()> {
        let settings = resolve(&[("OPENAI_API_KEY", "sk-secret")])?;

        assert_eq!(settings.missing_credentials(), vec!["PINECONE_API_KEY"]);
        assert!(!format!("{settings:?}").contains("sk-secret"));

        let statuses = settings.credentials();
        assert!(statuses.iter().any(|s| s.name == "OPENAI_API_KEY" && s.configured));
        Ok(())
    }

    #[test]
    fn memory_backend_needs_no_pinecone_key() -> anyhow::Result<()> {
        let settings = resolve(&[("VECTOR_BACKEND", "memory")])?;
        assert_eq!(settings.missing_credentials(), vec!["OPENAI_API_KEY"]);
        Ok(())
    }
}
