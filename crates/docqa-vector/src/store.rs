//! Vector store backend trait and record types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::VectorResult;

/// Metadata attached to a stored vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Distance metric of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity, higher is closer.
    #[default]
    Cosine,
    /// Dot product, higher is closer.
    DotProduct,
    /// Euclidean distance, lower is closer.
    Euclidean,
}

/// Vector data to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier for the vector.
    pub id: String,
    /// The embedding vector.
    #[serde(rename = "values")]
    pub vector: Vec<f32>,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl VectorRecord {
    /// Creates a new record with an ID and embedding.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: Metadata::new(),
        }
    }

    /// Replaces the record's metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Search result from a vector query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Vector ID.
    pub id: String,
    /// Similarity score.
    pub score: f32,
    /// The vector (if requested).
    #[serde(default, rename = "values", skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Associated metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Search options.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Include vectors in results.
    pub include_vectors: bool,
    /// Include metadata in results.
    pub include_metadata: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_vectors: false,
            include_metadata: true,
        }
    }
}

impl SearchOptions {
    /// Creates default search options (metadata, no vectors).
    pub fn new() -> Self {
        Self::default()
    }

    /// Include vectors in results.
    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }
}

/// Declared shape and fill level of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Declared vector dimensionality.
    pub dimension: usize,
    /// Number of stored vectors.
    pub vector_count: u64,
    /// Distance metric.
    pub metric: Metric,
}

/// Trait for vector store backends.
#[async_trait]
pub trait VectorStoreBackend: Send + Sync {
    /// Returns the backend name for logs.
    fn name(&self) -> &'static str;

    /// Lists the names of all registered indexes.
    async fn list_indexes(&self) -> VectorResult<Vec<String>>;

    /// Checks if an index exists.
    async fn index_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.list_indexes().await?.iter().any(|index| index == name))
    }

    /// Creates an index and waits until it accepts writes.
    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> VectorResult<()>;

    /// Deletes an index.
    async fn delete_index(&self, name: &str) -> VectorResult<()>;

    /// Returns the index's dimension, vector count and metric.
    async fn describe_index(&self, name: &str) -> VectorResult<IndexStats>;

    /// Inserts or overwrites records by id.
    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> VectorResult<()>;

    /// Returns the `limit` closest records, best first.
    async fn query(
        &self,
        index: &str,
        vector: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>>;
}
