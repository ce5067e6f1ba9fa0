#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for configuration resolution.
pub const TRACING_TARGET_CONFIG: &str = "docqa_core::config";

/// Tracing target for embedding operations.
pub const TRACING_TARGET_EMBEDDING: &str = "docqa_core::emb";

mod error;

pub mod config;
pub mod document;
pub mod emb;
pub mod llm;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use document::{Chunk, DocumentPage};
pub use emb::Embedder;
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use llm::Generator;
