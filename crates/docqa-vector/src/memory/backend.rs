//! In-memory backend implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{IndexStats, Metric, SearchOptions, SearchResult, VectorRecord, VectorStoreBackend};

struct MemoryIndex {
    dimension: usize,
    metric: Metric,
    records: BTreeMap<String, VectorRecord>,
}

/// Process-local backend with exact nearest-neighbour search.
#[derive(Default)]
pub struct MemoryBackend {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_indexes(&self) -> VectorResult<Vec<String>> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn index_exists(&self, name: &str) -> VectorResult<bool> {
        Ok(self.indexes.read().await.contains_key(name))
    }

    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> VectorResult<()> {
        if dimension == 0 {
            return Err(VectorError::invalid_config("dimension must be greater than 0"));
        }

        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(name) {
            return Err(VectorError::backend(format!("index '{name}' already exists")));
        }

        indexes.insert(
            name.to_owned(),
            MemoryIndex {
                dimension,
                metric,
                records: BTreeMap::new(),
            },
        );

        tracing::debug!(
            target: TRACING_TARGET,
            index = %name,
            dimension,
            metric = %metric,
            "Created in-memory index"
        );

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> VectorResult<()> {
        self.indexes
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorError::index_not_found(name))
    }

    async fn describe_index(&self, name: &str) -> VectorResult<IndexStats> {
        let indexes = self.indexes.read().await;
        let index = indexes
            .get(name)
            .ok_or_else(|| VectorError::index_not_found(name))?;

        Ok(IndexStats {
            dimension: index.dimension,
            vector_count: index.records.len() as u64,
            metric: index.metric,
        })
    }

    async fn upsert(&self, index: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
        let mut indexes = self.indexes.write().await;
        let target = indexes
            .get_mut(index)
            .ok_or_else(|| VectorError::index_not_found(index))?;

        if let Some(record) = records.iter().find(|r| r.vector.len() != target.dimension) {
            return Err(VectorError::dimension_mismatch(
                target.dimension,
                record.vector.len(),
            ));
        }

        for record in records {
            target.records.insert(record.id.clone(), record);
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
        let indexes = self.indexes.read().await;
        let target = indexes
            .get(index)
            .ok_or_else(|| VectorError::index_not_found(index))?;

        if vector.len() != target.dimension {
            return Err(VectorError::dimension_mismatch(target.dimension, vector.len()));
        }

        let mut scored: Vec<(f32, &VectorRecord)> = target
            .records
            .values()
            .map(|record| (score(target.metric, &vector, &record.vector), record))
            .collect();

        // Euclidean distances rank ascending, similarities descending.
        scored.sort_by(|(a, _), (b, _)| match target.metric {
            Metric::Euclidean => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            Metric::Cosine | Metric::DotProduct => b.partial_cmp(a).unwrap_or(Ordering::Equal),
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, record)| SearchResult {
                id: record.id.clone(),
                score,
                vector: options.include_vectors.then(|| record.vector.clone()),
                metadata: if options.include_metadata {
                    record.metadata.clone()
                } else {
                    Default::default()
                },
            })
            .collect())
    }
}

fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match metric {
        Metric::DotProduct => dot,
        Metric::Euclidean => a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum(),
        Metric::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, vector)
    }

    #[tokio::test]
    async fn query_orders_by_cosine_similarity() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend.create_index("kb", 2, Metric::Cosine).await?;
        backend
            .upsert(
                "kb",
                vec![
                    record("east", vec![1.0, 0.0]),
                    record("north", vec![0.0, 1.0]),
                    record("north-east", vec![1.0, 1.0]),
                ],
            )
            .await?;

        let results = backend
            .query("kb", vec![1.0, 0.1], 2, SearchOptions::new())
            .await?;

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["east", "north-east"]);
        assert!(results[0].score > results[1].score);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend.create_index("kb", 2, Metric::Cosine).await?;
        backend.upsert("kb", vec![record("a", vec![1.0, 0.0])]).await?;
        backend.upsert("kb", vec![record("a", vec![0.0, 1.0])]).await?;

        assert_eq!(backend.describe_index("kb").await?.vector_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend.create_index("kb", 3, Metric::Cosine).await?;

        let error = backend
            .upsert("kb", vec![record("a", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn missing_index_is_reported() {
        let backend = MemoryBackend::new();
        let error = backend
            .query("missing", vec![1.0], 1, SearchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, VectorError::IndexNotFound(_)));
        assert!(!backend.index_exists("missing").await.unwrap_or(true));
    }
}
