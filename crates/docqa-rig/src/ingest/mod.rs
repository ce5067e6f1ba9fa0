//! Index ingestion: load, split, embed and upsert.

use std::sync::Arc;

use docqa_core::config::Settings;
use docqa_core::{Embedder, Error, Result};
use docqa_vector::{IndexGateway, PopulateOptions, PopulateOutcome, PopulateReport};
use serde::Serialize;

use crate::TRACING_TARGET_INGEST;
use crate::loader::{LoadFailure, PdfLoader};
use crate::splitter::Chunker;

/// Summary of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// PDF files read.
    pub files: usize,
    /// Pages extracted.
    pub pages: usize,
    /// Chunks produced.
    pub chunks: usize,
    /// Files that were skipped.
    pub failures: Vec<LoadFailure>,
    /// What happened to the index.
    #[serde(flatten)]
    pub populate: PopulateReport,
}

impl IngestReport {
    /// Returns true if the index was already populated and left untouched.
    pub fn is_skipped(&self) -> bool {
        self.populate.is_skipped()
    }

    /// One-line summary for logs and console output.
    pub fn summary(&self) -> String {
        match &self.populate.outcome {
            PopulateOutcome::Skipped { existing_vectors } => format!(
                "Index '{}' already holds {existing_vectors} vectors; skipped ingestion",
                self.populate.index
            ),
            PopulateOutcome::Populated { created, upserted } => format!(
                "{} index '{}' with {upserted} chunks from {} files ({} pages, {} skipped)",
                if *created { "Created" } else { "Updated" },
                self.populate.index,
                self.files,
                self.pages,
                self.failures.len()
            ),
        }
    }
}

/// Builds a vector index from a directory of PDFs.
#[derive(Clone)]
pub struct Ingestor {
    gateway: IndexGateway,
    embedder: Arc<dyn Embedder>,
    loader: PdfLoader,
    chunker: Chunker,
    index_name: String,
}

impl Ingestor {
    /// Creates an ingestor.
    pub fn new(
        gateway: IndexGateway,
        embedder: Arc<dyn Embedder>,
        loader: PdfLoader,
        chunker: Chunker,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            embedder,
            loader,
            chunker,
            index_name: index_name.into(),
        }
    }

    /// Creates an ingestor using the document, chunking and index settings.
    pub fn from_settings(
        settings: &Settings,
        gateway: IndexGateway,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Ok(Self::new(
            gateway,
            embedder,
            PdfLoader::from_settings(&settings.documents),
            Chunker::from_settings(&settings.chunking)?,
            &settings.index.name,
        ))
    }

    /// Returns the target index name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Runs ingestion.
    ///
    /// A populated index is left alone, without reading any PDF, unless
    /// `options.force` is set. Re-ingesting overwrites records in place
    /// because chunk ids are derived from their provenance.
    pub async fn run(&self, options: PopulateOptions) -> Result<IngestReport> {
        let index = &self.index_name;

        if !options.force && self.gateway.is_populated(index).await? {
            let stats = self.gateway.stats(index).await?;
            tracing::warn!(
                target: TRACING_TARGET_INGEST,
                index = %index,
                existing_vectors = stats.vector_count,
                "Index already populated, skipping document loading"
            );

            return Ok(IngestReport {
                files: 0,
                pages: 0,
                chunks: 0,
                failures: Vec::new(),
                populate: PopulateReport {
                    index: index.clone(),
                    dimension: stats.dimension,
                    outcome: PopulateOutcome::Skipped {
                        existing_vectors: stats.vector_count,
                    },
                },
            });
        }

        let loader = self.loader.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| Error::load("document loader task failed").with_source(e))??;

        let chunks = self.chunker.split(&loaded.pages);
        if chunks.is_empty() {
            return Err(Error::load(format!(
                "no extractable text in {} pages under '{}'",
                loaded.pages.len(),
                self.loader.root().display()
            )));
        }

        tracing::info!(
            target: TRACING_TARGET_INGEST,
            index = %index,
            files = loaded.files,
            pages = loaded.pages.len(),
            chunks = chunks.len(),
            strategy = %self.chunker.strategy(),
            "Documents split into chunks"
        );

        let populate = self
            .gateway
            .create_and_populate(index, &chunks, self.embedder.as_ref(), options)
            .await?;

        let report = IngestReport {
            files: loaded.files,
            pages: loaded.pages.len(),
            chunks: chunks.len(),
            failures: loaded.failures,
            populate,
        };

        tracing::info!(
            target: TRACING_TARGET_INGEST,
            summary = %report.summary(),
            "Ingestion finished"
        );

        Ok(report)
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("index", &self.index_name)
            .field("loader", &self.loader)
            .field("chunker", &self.chunker)
            .field("embedder", &self.embedder.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use docqa_core::ErrorKind;
    use docqa_core::config::ChunkStrategy;
    use docqa_core::mock::MockEmbedder;
    use docqa_vector::memory::MemoryBackend;

    use super::*;
    use crate::testing::write_pdf;

    const INDEX: &str = "kb";

    fn ingestor(dir: &std::path::Path, embedder: Arc<MockEmbedder>) -> anyhow::Result<Ingestor> {
        Ok(Ingestor::new(
            IndexGateway::new(MemoryBackend::new()),
            embedder,
            PdfLoader::new(dir),
            Chunker::new(500, 20, ChunkStrategy::Window)?,
            INDEX,
        ))
    }

    #[tokio::test]
    async fn populates_then_skips() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_pdf(
            dir.path().join("guide.pdf"),
            &["Aspirin treats headaches.", "Insulin regulates blood sugar."],
        )?;
        fs::write(dir.path().join("broken.pdf"), b"garbage")?;

        let embedder = Arc::new(MockEmbedder::default());
        let ingestor = ingestor(dir.path(), embedder.clone())?;

        let first = ingestor.run(PopulateOptions::default()).await?;
        assert_eq!(first.files, 1);
        assert_eq!(first.pages, 2);
        assert_eq!(first.chunks, 2);
        assert_eq!(first.failures.len(), 1);
        assert_eq!(
            first.populate.outcome,
            PopulateOutcome::Populated {
                created: true,
                upserted: 2
            }
        );
        assert!(first.summary().starts_with("Created index 'kb' with 2 chunks"));

        let calls = embedder.calls();
        let second = ingestor.run(PopulateOptions::default()).await?;
        assert!(second.is_skipped());
        assert_eq!(embedder.calls(), calls);

        let forced = ingestor.run(PopulateOptions { force: true }).await?;
        assert_eq!(
            forced.populate.outcome,
            PopulateOutcome::Populated {
                created: false,
                upserted: 2
            }
        );
        assert_eq!(ingestor.gateway.stats(INDEX).await?.vector_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn blank_documents_are_a_load_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_pdf(dir.path().join("blank.pdf"), &[""])?;

        let ingestor = ingestor(dir.path(), Arc::new(MockEmbedder::default()))?;
        let err = ingestor.run(PopulateOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(!ingestor.gateway.exists(INDEX).await?);
        Ok(())
    }

    #[tokio::test]
    async fn missing_directory_is_a_load_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ingestor = ingestor(&dir.path().join("absent"), Arc::new(MockEmbedder::default()))?;

        let err = ingestor.run(PopulateOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        Ok(())
    }
}
