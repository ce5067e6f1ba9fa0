//! Index lifecycle gateway: existence checks, population and top-k queries.

use std::sync::Arc;

use docqa_core::document::{METADATA_PAGE, METADATA_SOURCE, METADATA_TEXT};
use docqa_core::emb::embed_batched;
use docqa_core::{Chunk, Embedder, Error, Result};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::config::VectorStoreConfig;
use crate::memory::MemoryBackend;
use crate::pinecone::PineconeBackend;
use crate::store::{IndexStats, Metric, SearchOptions, SearchResult, VectorRecord, VectorStoreBackend};

/// Options for [`IndexGateway::create_and_populate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateOptions {
    /// Re-embed and upsert even when the index already holds vectors.
    #[serde(default)]
    pub force: bool,
}

/// What [`IndexGateway::create_and_populate`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PopulateOutcome {
    /// The index already held vectors; nothing was written.
    Skipped {
        /// Vectors already present.
        existing_vectors: u64,
    },
    /// Chunks were embedded and upserted.
    Populated {
        /// Whether the index was created by this call.
        created: bool,
        /// Number of records upserted.
        upserted: usize,
    },
}

/// Summary of a population run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateReport {
    /// Index name.
    pub index: String,
    /// Index dimensionality.
    pub dimension: usize,
    /// Outcome of the run.
    #[serde(flatten)]
    pub outcome: PopulateOutcome,
}

impl PopulateReport {
    /// Returns true if the run was a no-op.
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, PopulateOutcome::Skipped { .. })
    }
}

/// A retrieved chunk with its similarity score.
///
/// Provenance fields are optional because records written by other tools may
/// lack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Record id.
    pub id: String,
    /// Similarity score, higher is closer.
    pub score: f32,
    /// Source document path, if recorded.
    pub source_path: Option<String>,
    /// 0-based page number, if recorded.
    pub page_number: Option<u32>,
    /// Chunk text, empty if not recorded.
    pub text: String,
}

impl From<SearchResult> for ScoredChunk {
    fn from(result: SearchResult) -> Self {
        let metadata = &result.metadata;
        let source_path = metadata
            .get(METADATA_SOURCE)
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        // Pinecone returns numeric metadata as floats.
        let page_number = metadata.get(METADATA_PAGE).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|page| u32::try_from(page).ok())
        });
        let text = metadata
            .get(METADATA_TEXT)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned();

        Self {
            id: result.id,
            score: result.score,
            source_path,
            page_number,
            text,
        }
    }
}

/// Gateway over a [`VectorStoreBackend`].
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct IndexGateway {
    backend: Arc<dyn VectorStoreBackend>,
}

impl IndexGateway {
    /// Wraps an existing backend.
    pub fn new(backend: impl VectorStoreBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Creates the backend described by `config`.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self> {
        let gateway = match config {
            VectorStoreConfig::Pinecone(cfg) => Self::new(PineconeBackend::new(cfg)?),
            VectorStoreConfig::Memory => Self::new(MemoryBackend::new()),
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.backend_name(),
            "Vector store initialized"
        );

        Ok(gateway)
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns true if an index with that name is registered.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let exists = self.backend.index_exists(name).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            index = %name,
            exists,
            "Checked index existence"
        );
        Ok(exists)
    }

    /// Returns the index's dimension, vector count and metric.
    pub async fn stats(&self, name: &str) -> Result<IndexStats> {
        Ok(self.backend.describe_index(name).await?)
    }

    /// Returns true if the index exists and holds at least one vector.
    pub async fn is_populated(&self, name: &str) -> Result<bool> {
        if !self.exists(name).await? {
            return Ok(false);
        }
        Ok(self.stats(name).await?.vector_count > 0)
    }

    /// Deletes the index.
    pub async fn delete(&self, name: &str) -> Result<()> {
        tracing::info!(target: TRACING_TARGET, index = %name, "Deleting index");
        Ok(self.backend.delete_index(name).await?)
    }

    /// Creates the index if absent, embeds `chunks` and upserts them.
    ///
    /// An index that already holds vectors is left untouched unless
    /// `options.force` is set. Only the vector count is inspected, so edits to
    /// the source documents are not detected. An existing index whose
    /// dimension differs from `embedder.ndims()` is a configuration error,
    /// raised before anything is written.
    pub async fn create_and_populate(
        &self,
        name: &str,
        chunks: &[Chunk],
        embedder: &dyn Embedder,
        options: PopulateOptions,
    ) -> Result<PopulateReport> {
        if chunks.is_empty() {
            return Err(Error::invalid_input("no chunks to index"));
        }

        let ndims = embedder.ndims();
        let created = if self.exists(name).await? {
            let stats = self.stats(name).await?;
            if stats.dimension != ndims {
                return Err(Error::config(format!(
                    "index '{name}' has dimension {}, but embedding model '{}' produces {ndims}",
                    stats.dimension,
                    embedder.model_name()
                )));
            }

            if stats.vector_count > 0 && !options.force {
                tracing::warn!(
                    target: TRACING_TARGET,
                    index = %name,
                    existing_vectors = stats.vector_count,
                    "Index already populated, skipping ingestion; document changes are not detected"
                );

                return Ok(PopulateReport {
                    index: name.to_owned(),
                    dimension: stats.dimension,
                    outcome: PopulateOutcome::Skipped {
                        existing_vectors: stats.vector_count,
                    },
                });
            }

            false
        } else {
            true
        };

        // Embed before touching the store so a failure leaves nothing behind.
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embed_batched(embedder, &texts).await?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                VectorRecord::new(chunk.id.clone(), vector).with_metadata(chunk.metadata())
            })
            .collect();
        let upserted = records.len();

        if created {
            self.backend.create_index(name, ndims, Metric::Cosine).await?;
        }

        if let Err(err) = self.backend.upsert(name, records).await {
            if created {
                self.discard_created(name).await;
            }
            return Err(err.into());
        }

        tracing::info!(
            target: TRACING_TARGET,
            index = %name,
            created,
            upserted,
            model = %embedder.model_name(),
            "Index populated"
        );

        Ok(PopulateReport {
            index: name.to_owned(),
            dimension: ndims,
            outcome: PopulateOutcome::Populated { created, upserted },
        })
    }

    /// Removes an index this gateway just created after a failed upsert.
    async fn discard_created(&self, name: &str) {
        if let Err(err) = self.backend.delete_index(name).await {
            tracing::error!(
                target: TRACING_TARGET,
                index = %name,
                error = %err,
                "Failed to remove index after a failed upsert"
            );
        }
    }

    /// Returns the `k` stored chunks closest to `query`, best first.
    pub async fn query(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(Error::invalid_input("k must be at least 1"));
        }
        if query.is_empty() {
            return Err(Error::invalid_input("query vector is empty"));
        }

        let results = self
            .backend
            .query(name, query.to_vec(), k, SearchOptions::new())
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            index = %name,
            k,
            returned = results.len(),
            "Queried index"
        );

        Ok(results.into_iter().map(ScoredChunk::from).collect())
    }
}

impl std::fmt::Debug for IndexGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexGateway")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::mock::MockEmbedder;
    use docqa_core::{DocumentPage, ErrorKind};

    use super::*;

    fn chunks() -> Vec<Chunk> {
        let first = DocumentPage::new("Aspirin treats headaches.", "a.pdf", 0);
        let second = DocumentPage::new("Insulin regulates blood glucose.", "b.pdf", 2);
        vec![
            Chunk::new(&first, first.text.clone(), 0, 0),
            Chunk::new(&second, second.text.clone(), 0, 0),
        ]
    }

    fn gateway() -> IndexGateway {
        IndexGateway::new(MemoryBackend::new())
    }

    #[tokio::test]
    async fn populate_creates_missing_index() -> anyhow::Result<()> {
        let gateway = gateway();
        let embedder = MockEmbedder::new(16);

        assert!(!gateway.exists("kb").await?);
        let report = gateway
            .create_and_populate("kb", &chunks(), &embedder, PopulateOptions::default())
            .await?;

        assert!(gateway.exists("kb").await?);
        assert_eq!(
            report.outcome,
            PopulateOutcome::Populated {
                created: true,
                upserted: 2
            }
        );
        assert_eq!(gateway.stats("kb").await?.dimension, 16);
        Ok(())
    }

    #[tokio::test]
    async fn second_populate_is_a_no_op() -> anyhow::Result<()> {
        let gateway = gateway();
        let embedder = MockEmbedder::new(16);
        let chunks = chunks();

        gateway
            .create_and_populate("kb", &chunks, &embedder, PopulateOptions::default())
            .await?;
        let calls = embedder.calls();
        let report = gateway
            .create_and_populate("kb", &chunks, &embedder, PopulateOptions::default())
            .await?;

        assert!(report.is_skipped());
        assert_eq!(embedder.calls(), calls);
        assert_eq!(gateway.stats("kb").await?.vector_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn forced_populate_overwrites_instead_of_duplicating() -> anyhow::Result<()> {
        let gateway = gateway();
        let embedder = MockEmbedder::new(16);
        let chunks = chunks();

        gateway
            .create_and_populate("kb", &chunks, &embedder, PopulateOptions::default())
            .await?;
        let report = gateway
            .create_and_populate("kb", &chunks, &embedder, PopulateOptions { force: true })
            .await?;

        assert_eq!(
            report.outcome,
            PopulateOutcome::Populated {
                created: false,
                upserted: 2
            }
        );
        assert_eq!(gateway.stats("kb").await?.vector_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn dimension_mismatch_is_config_error() -> anyhow::Result<()> {
        let gateway = gateway();
        gateway
            .create_and_populate(
                "kb",
                &chunks(),
                &MockEmbedder::new(16),
                PopulateOptions::default(),
            )
            .await?;

        let error = gateway
            .create_and_populate(
                "kb",
                &chunks(),
                &MockEmbedder::new(32),
                PopulateOptions { force: true },
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Config);
        Ok(())
    }

    #[tokio::test]
    async fn stored_vector_is_its_own_nearest_neighbour() -> anyhow::Result<()> {
        let gateway = gateway();
        let embedder = MockEmbedder::new(64);
        let chunks = chunks();
        gateway
            .create_and_populate("kb", &chunks, &embedder, PopulateOptions::default())
            .await?;

        let vector = embedder.vector(&chunks[1].text);
        let results = gateway.query("kb", &vector, 2).await?;

        assert_eq!(results[0].id, chunks[1].id);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[0].source_path.as_deref(), Some("b.pdf"));
        assert_eq!(results[0].page_number, Some(2));
        assert_eq!(results[0].text, chunks[1].text);
        Ok(())
    }

    #[tokio::test]
    async fn query_validates_arguments() -> anyhow::Result<()> {
        let gateway = gateway();

        let error = gateway.query("kb", &[1.0], 0).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);

        let error = gateway.query("missing", &[1.0], 3).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::IndexNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn empty_chunks_are_rejected() {
        let error = gateway()
            .create_and_populate("kb", &[], &MockEmbedder::new(8), PopulateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() -> anyhow::Result<()> {
        let gateway = gateway();
        let embedder = MockEmbedder::new(8).failing("model offline");

        let error = gateway
            .create_and_populate("kb", &chunks(), &embedder, PopulateOptions::default())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Embedding);
        assert!(!gateway.exists("kb").await?);
        assert!(!gateway.is_populated("kb").await?);
        Ok(())
    }

    /// Memory backend whose writes always fail.
    struct RejectingUpserts(MemoryBackend);

    #[async_trait::async_trait]
    impl VectorStoreBackend for RejectingUpserts {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn list_indexes(&self) -> crate::VectorResult<Vec<String>> {
            self.0.list_indexes().await
        }

        async fn create_index(
            &self,
            name: &str,
            dimension: usize,
            metric: Metric,
        ) -> crate::VectorResult<()> {
            self.0.create_index(name, dimension, metric).await
        }

        async fn delete_index(&self, name: &str) -> crate::VectorResult<()> {
            self.0.delete_index(name).await
        }

        async fn describe_index(&self, name: &str) -> crate::VectorResult<IndexStats> {
            self.0.describe_index(name).await
        }

        async fn upsert(&self, _: &str, _: Vec<VectorRecord>) -> crate::VectorResult<()> {
            Err(crate::VectorError::connection("write refused"))
        }

        async fn query(
            &self,
            index: &str,
            vector: Vec<f32>,
            limit: usize,
            options: crate::SearchOptions,
        ) -> crate::VectorResult<Vec<crate::SearchResult>> {
            self.0.query(index, vector, limit, options).await
        }
    }

    #[tokio::test]
    async fn failed_upsert_removes_the_new_index() -> anyhow::Result<()> {
        let gateway = IndexGateway::new(RejectingUpserts(MemoryBackend::new()));
        let embedder = MockEmbedder::new(8);

        let error = gateway
            .create_and_populate("kb", &chunks(), &embedder, PopulateOptions::default())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Index);
        assert!(!gateway.exists("kb").await?);
        Ok(())
    }

    #[test]
    fn scored_chunk_accepts_float_pages() {
        let mut metadata = crate::store::Metadata::new();
        metadata.insert("source".into(), "a.pdf".into());
        metadata.insert("page".into(), serde_json::json!(4.0));

        let chunk = ScoredChunk::from(SearchResult {
            id: "x".into(),
            score: 0.5,
            vector: None,
            metadata,
        });

        assert_eq!(chunk.page_number, Some(4));
        assert_eq!(chunk.text, "");
    }
}
