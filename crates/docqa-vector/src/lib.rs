#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod memory;
pub mod pinecone;

mod config;
mod error;
mod gateway;
mod store;

pub use config::{PineconeConfig, VectorStoreConfig};
pub use error::{VectorError, VectorResult};
pub use gateway::{IndexGateway, PopulateOptions, PopulateOutcome, PopulateReport, ScoredChunk};
pub use store::{
    IndexStats, Metadata, Metric, SearchOptions, SearchResult, VectorRecord, VectorStoreBackend,
};

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "docqa_vector";
