//! Pinecone backend implementation over the REST API.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::PineconeConfig;
use super::wire::{
    CreateIndexRequest, DescribeStatsRequest, DescribeStatsResponse, IndexList, IndexModel,
    IndexSpec, QueryRequest, QueryResponse, ServerlessSpec, UpsertRequest,
};
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{IndexStats, Metric, SearchOptions, SearchResult, VectorRecord, VectorStoreBackend};

/// Maximum records per upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Pinecone backend implementation.
pub struct PineconeBackend {
    http: reqwest::Client,
    config: PineconeConfig,
    hosts: RwLock<HashMap<String, String>>,
}

impl PineconeBackend {
    /// Creates a new Pinecone backend.
    pub fn new(config: &PineconeConfig) -> VectorResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("docqa-vector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            controller = %config.controller_url,
            cloud = %config.cloud,
            region = %config.region,
            "Pinecone backend initialized"
        );

        Ok(Self {
            http,
            config: config.clone(),
            hosts: RwLock::new(HashMap::new()),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", &self.config.api_version)
    }

    fn controller(&self, path: &str) -> String {
        format!("{}{path}", self.config.controller_url.trim_end_matches('/'))
    }

    async fn describe_model(&self, name: &str) -> VectorResult<IndexModel> {
        let response = self
            .request(Method::GET, &self.controller(&format!("/indexes/{name}")))
            .send()
            .await?;

        let model: IndexModel = parse(response, name).await?;
        if !model.host.is_empty() {
            self.hosts
                .write()
                .await
                .insert(name.to_owned(), model.host.clone());
        }

        Ok(model)
    }

    /// Resolves the data plane URL of `index`, caching the host.
    async fn data_plane(&self, index: &str, path: &str) -> VectorResult<String> {
        let cached = self.hosts.read().await.get(index).cloned();
        let host = match cached {
            Some(host) => host,
            None => self.describe_model(index).await?.host,
        };

        if host.is_empty() {
            return Err(VectorError::backend(format!(
                "index '{index}' has no data plane host yet"
            )));
        }

        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(format!("{host}{path}"))
        } else {
            Ok(format!("https://{host}{path}"))
        }
    }

    async fn wait_until_ready(&self, name: &str) -> VectorResult<()> {
        let deadline = Instant::now() + self.config.ready_timeout;

        loop {
            let model = self.describe_model(name).await?;
            if model.status.ready {
                tracing::debug!(
                    target: TRACING_TARGET,
                    index = %name,
                    "Pinecone index is ready"
                );
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(VectorError::timeout(format!(
                    "index '{name}' not ready after {}s (state: {})",
                    self.config.ready_timeout.as_secs(),
                    model.status.state
                )));
            }

            tracing::trace!(
                target: TRACING_TARGET,
                index = %name,
                state = %model.status.state,
                "Waiting for Pinecone index"
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl VectorStoreBackend for PineconeBackend {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    async fn list_indexes(&self) -> VectorResult<Vec<String>> {
        let response = self
            .request(Method::GET, &self.controller("/indexes"))
            .send()
            .await?;

        let list: IndexList = parse(response, "indexes").await?;
        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    async fn index_exists(&self, name: &str) -> VectorResult<bool> {
        match self.describe_model(name).await {
            Ok(_) => Ok(true),
            Err(VectorError::IndexNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> VectorResult<()> {
        let body = CreateIndexRequest {
            name,
            dimension,
            metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.config.cloud,
                    region: &self.config.region,
                },
            },
        };

        let response = self
            .request(Method::POST, &self.controller("/indexes"))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::warn!(
                target: TRACING_TARGET,
                index = %name,
                "Pinecone index already exists, reusing it"
            );
        } else {
            check(response, name).await?;
            tracing::info!(
                target: TRACING_TARGET,
                index = %name,
                dimension,
                metric = %metric,
                cloud = %self.config.cloud,
                region = %self.config.region,
                "Created Pinecone index"
            );
        }

        self.wait_until_ready(name).await
    }

    async fn delete_index(&self, name: &str) -> VectorResult<()> {
        let response = self
            .request(Method::DELETE, &self.controller(&format!("/indexes/{name}")))
            .send()
            .await?;

        check(response, name).await?;
        self.hosts.write().await.remove(name);
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> VectorResult<IndexStats> {
        let model = self.describe_model(name).await?;
        let url = self.data_plane(name, "/describe_index_stats").await?;

        let response = self
            .request(Method::POST, &url)
            .json(&DescribeStatsRequest {})
            .send()
            .await?;
        let stats: DescribeStatsResponse = parse(response, name).await?;

        let vector_count = match &self.config.namespace {
            Some(namespace) => stats
                .namespaces
                .get(namespace)
                .map_or(0, |summary| summary.vector_count),
            None => stats.total_vector_count,
        };

        Ok(IndexStats {
            dimension: model.dimension,
            vector_count,
            metric: model.metric,
        })
    }

    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
        let url = self.data_plane(index, "/vectors/upsert").await?;

        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let body = UpsertRequest {
                vectors: batch,
                namespace: self.config.namespace.as_deref(),
            };

            let response = self.request(Method::POST, &url).json(&body).send().await?;
            check(response, index).await?;

            tracing::debug!(
                target: TRACING_TARGET,
                index = %index,
                count = batch.len(),
                "Upserted batch into Pinecone"
            );
        }

        Ok(())
    }

    async fn query(
        &self,
        index: &str,
        vector: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>> {
        let url = self.data_plane(index, "/query").await?;
        let body = QueryRequest {
            vector,
            top_k: limit,
            include_metadata: options.include_metadata,
            include_values: options.include_vectors,
            namespace: self.config.namespace.as_deref(),
        };

        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let parsed: QueryResponse = parse(response, index).await?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|mut result| {
                if !options.include_vectors {
                    result.vector = None;
                }
                result
            })
            .collect())
    }
}

impl std::fmt::Debug for PineconeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Maps non-success statuses to [`VectorError`]s.
async fn check(response: Response, resource: &str) -> VectorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => VectorError::index_not_found(resource),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            VectorError::authentication(format!("{status}: {body}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            VectorError::timeout(format!("{status}: {body}"))
        }
        _ => VectorError::backend(format!("{status}: {body}")),
    })
}

async fn parse<T: DeserializeOwned>(response: Response, resource: &str) -> VectorResult<T> {
    let response = check(response, resource).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
