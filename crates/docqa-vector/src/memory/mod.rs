//! In-memory vector store backend.

mod backend;

pub use backend::MemoryBackend;
