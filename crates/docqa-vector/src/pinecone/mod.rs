//! Pinecone vector store backend.

mod backend;
mod config;
mod wire;

pub use backend::PineconeBackend;
pub use config::{DEFAULT_API_VERSION, DEFAULT_CONTROLLER_URL, PineconeBuilder, PineconeConfig};
