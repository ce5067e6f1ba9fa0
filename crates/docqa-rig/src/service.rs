//! Service combining ingestion and answering from resolved settings.

use std::sync::Arc;

use docqa_core::config::{CredentialStatus, Settings, VectorBackendKind, keys};
use docqa_core::{Embedder, Error, Result};
use docqa_vector::{IndexGateway, PineconeConfig, PopulateOptions, VectorStoreConfig};

use crate::TRACING_TARGET;
use crate::ingest::{IngestReport, Ingestor};
use crate::provider::EmbeddingProvider;
use crate::rag::{GeneratorSlot, RagPipeline};

/// Inner state for [`RagService`].
struct RagServiceInner {
    settings: Settings,
    gateway: Option<IndexGateway>,
    embedder: Arc<dyn Embedder>,
    generator: GeneratorSlot,
}

/// Ingestion and answering over one configured index.
///
/// The vector index or the completion model may be unavailable when their
/// credentials are missing. Operations needing them fail with a `Config`
/// error naming the key; everything else keeps working.
#[derive(Clone)]
pub struct RagService {
    inner: Arc<RagServiceInner>,
}

impl RagService {
    /// Creates the service and every provider the settings describe.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let gateway = match vector_store_config(&settings)? {
            Some(config) => Some(IndexGateway::from_config(&config)?),
            None => None,
        };
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingProvider::from_settings(&settings)?);
        let generator = GeneratorSlot::from_settings(&settings)?;

        let missing = settings.missing_credentials();
        if !missing.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET,
                missing = %missing.join(", "),
                "Credentials missing, dependent operations are disabled"
            );
        }

        Ok(Self::with_components(settings, gateway, embedder, generator))
    }

    /// Creates the service from prepared components.
    pub fn with_components(
        settings: Settings,
        gateway: Option<IndexGateway>,
        embedder: Arc<dyn Embedder>,
        generator: GeneratorSlot,
    ) -> Self {
        Self {
            inner: Arc::new(RagServiceInner {
                settings,
                gateway,
                embedder,
                generator,
            }),
        }
    }

    /// Returns the resolved settings.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Returns the configured index name.
    pub fn index_name(&self) -> &str {
        &self.inner.settings.index.name
    }

    /// Returns the embedding model.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.inner.embedder
    }

    /// Returns the completion model slot.
    pub fn generator(&self) -> &GeneratorSlot {
        &self.inner.generator
    }

    /// Reports presence of the required credentials.
    pub fn credentials(&self) -> Vec<CredentialStatus> {
        self.inner.settings.credentials()
    }

    /// Returns the names of missing required credentials.
    pub fn missing_credentials(&self) -> Vec<String> {
        self.inner.settings.missing_credentials()
    }

    /// Returns the index gateway, or a `Config` error if it is unavailable.
    pub fn gateway(&self) -> Result<&IndexGateway> {
        self.inner.gateway.as_ref().ok_or_else(|| {
            Error::config(format!("{} is not configured", keys::PINECONE_API_KEY))
        })
    }

    /// Returns true if the configured index exists.
    pub async fn index_exists(&self) -> Result<bool> {
        self.gateway()?.exists(self.index_name()).await
    }

    /// Returns true if the configured index exists and holds vectors.
    pub async fn index_populated(&self) -> Result<bool> {
        self.gateway()?.is_populated(self.index_name()).await
    }

    /// Builds a question-answering pipeline over the configured index.
    pub fn pipeline(&self) -> Result<RagPipeline> {
        RagPipeline::new(
            self.gateway()?.clone(),
            self.inner.embedder.clone(),
            self.inner.generator.clone(),
            self.index_name(),
            self.inner.settings.retriever_k,
        )
    }

    /// Builds an ingestor for the configured data directory and index.
    pub fn ingestor(&self) -> Result<Ingestor> {
        Ingestor::from_settings(
            &self.inner.settings,
            self.gateway()?.clone(),
            self.inner.embedder.clone(),
        )
    }

    /// Loads, splits, embeds and upserts the configured documents.
    pub async fn ingest(&self, options: PopulateOptions) -> Result<IngestReport> {
        self.ingestor()?.run(options).await
    }
}

impl std::fmt::Debug for RagService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagService")
            .field("index", &self.index_name())
            .field("gateway", &self.inner.gateway)
            .field("embedder", &self.inner.embedder.model_name())
            .field("generator", &self.inner.generator)
            .finish()
    }
}

/// Maps index settings to a backend configuration.
///
/// Returns `None` for Pinecone without an API key.
fn vector_store_config(settings: &Settings) -> Result<Option<VectorStoreConfig>> {
    let index = &settings.index;
    match index.backend {
        VectorBackendKind::Memory => Ok(Some(VectorStoreConfig::Memory)),
        VectorBackendKind::Pinecone => {
            let Some(api_key) = settings.credentials.pinecone_api_key.clone() else {
                return Ok(None);
            };

            let mut builder = PineconeConfig::builder()
                .with_api_key(api_key)
                .with_cloud(index.cloud.clone())
                .with_region(index.region.clone())
                .with_controller_url(index.controller_url.clone());
            if let Some(namespace) = &index.namespace {
                builder = builder.with_namespace(namespace.clone());
            }

            let config = builder
                .build()
                .map_err(|e| Error::config(format!("invalid pinecone settings: {e}")))?;
            Ok(Some(VectorStoreConfig::Pinecone(config)))
        }
    }
}
