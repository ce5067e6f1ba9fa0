//! Layered configuration resolution.
//!
//! Values are looked up in order: secrets file, process environment, then
//! built-in defaults. The first layer defining a non-blank value wins.
//!
//! ```text
//! Resolver
//! ├── SecretsFile   # secrets.toml, flat KEY = "value" table
//! ├── EnvSource     # std::env, optionally seeded from .env
//! └── defaults      # constants in `settings`
//! ```

mod settings;
mod source;

pub use settings::{
    ChunkStrategy, ChunkingSettings, CredentialStatus, Credentials, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_INDEX_NAME,
    DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE, DEFAULT_PDF_DATA_PATH, DEFAULT_RETRIEVER_K,
    DocumentSettings, EmbeddingProviderKind, EmbeddingSettings, IndexSettings, LlmSettings,
    Settings, VectorBackendKind,
};
pub use source::{EnvSource, MapSource, Resolver, SecretSource, SecretsFile};

/// Key names understood by the resolver.
pub mod keys {
    pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";

    pub const VECTOR_BACKEND: &str = "VECTOR_BACKEND";
    pub const PINECONE_INDEX_NAME: &str = "PINECONE_INDEX_NAME";
    pub const PINECONE_CLOUD: &str = "PINECONE_CLOUD";
    pub const PINECONE_REGION: &str = "PINECONE_REGION";
    pub const PINECONE_NAMESPACE: &str = "PINECONE_NAMESPACE";
    pub const PINECONE_CONTROLLER_URL: &str = "PINECONE_CONTROLLER_URL";

    pub const EMBEDDING_PROVIDER: &str = "EMBEDDING_PROVIDER";
    pub const EMBEDDING_MODEL_NAME: &str = "EMBEDDING_MODEL_NAME";
    pub const EMBEDDING_DIMENSIONS: &str = "EMBEDDING_DIMENSIONS";
    pub const HUGGINGFACE_BASE_URL: &str = "HUGGINGFACE_BASE_URL";
    pub const OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";

    pub const CHUNK_SIZE: &str = "CHUNK_SIZE";
    pub const CHUNK_OVERLAP: &str = "CHUNK_OVERLAP";
    pub const CHUNK_STRATEGY: &str = "CHUNK_STRATEGY";

    pub const LLM_MODEL: &str = "LLM_MODEL";
    pub const LLM_TEMPERATURE: &str = "LLM_TEMPERATURE";
    pub const RETRIEVER_K: &str = "RETRIEVER_K";

    pub const PDF_DATA_PATH: &str = "PDF_DATA_PATH";
    pub const PDF_RECURSIVE: &str = "PDF_RECURSIVE";
}
