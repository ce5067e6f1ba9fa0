#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod ingest;
pub mod loader;
pub mod provider;
pub mod rag;
mod service;
pub mod splitter;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod testing;

pub use service::RagService;

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "docqa_rig";

/// Tracing target for document loading.
pub const TRACING_TARGET_LOADER: &str = "docqa_rig::loader";

/// Tracing target for the answer pipeline.
pub const TRACING_TARGET_RAG: &str = "docqa_rig::rag";

/// Tracing target for index ingestion.
pub const TRACING_TARGET_INGEST: &str = "docqa_rig::ingest";
