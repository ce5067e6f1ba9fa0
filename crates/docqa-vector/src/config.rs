//! Vector store configuration types.

pub use crate::pinecone::PineconeConfig;

/// Vector store backend configuration.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum VectorStoreConfig {
    /// Pinecone managed vector database.
    Pinecone(PineconeConfig),
    /// Process-local index.
    Memory,
}

impl VectorStoreConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Pinecone(_) => "pinecone",
            Self::Memory => "memory",
        }
    }
}
