//! Hosted model providers.
//!
//! ```text
//! provider
//! ├── embedding    # EmbeddingProvider: Hugging Face, OpenAI, Ollama
//! └── completion   # CompletionProvider: OpenAI chat completions
//! ```

pub mod completion;
pub mod embedding;

pub use completion::CompletionProvider;
pub use embedding::EmbeddingProvider;
