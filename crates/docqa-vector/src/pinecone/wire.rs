//! Pinecone REST request and response bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::{Metric, SearchResult, VectorRecord};

#[derive(Debug, Deserialize)]
pub(super) struct IndexList {
    #[serde(default)]
    pub indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IndexModel {
    pub name: String,
    pub dimension: usize,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateIndexRequest<'a> {
    pub name: &'a str,
    pub dimension: usize,
    pub metric: Metric,
    pub spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct IndexSpec<'a> {
    pub serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct ServerlessSpec<'a> {
    pub cloud: &'a str,
    pub region: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct DescribeStatsRequest {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DescribeStatsResponse {
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceSummary>,
    #[serde(default)]
    pub total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NamespaceSummary {
    #[serde(default)]
    pub vector_count: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct UpsertRequest<'a> {
    pub vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QueryRequest<'a> {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_metadata: bool,
    pub include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_request_uses_camel_case() -> anyhow::Result<()> {
        let body = serde_json::to_value(QueryRequest {
            vector: vec![0.5],
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: None,
        })?;

        assert_eq!(body["topK"], 3);
        assert_eq!(body["includeMetadata"], true);
        assert!(body.get("namespace").is_none());
        Ok(())
    }

    #[test]
    fn stats_response_parses_namespaces() -> anyhow::Result<()> {
        let stats: DescribeStatsResponse = serde_json::from_str(
            r#"{"namespaces":{"docs":{"vectorCount":12}},"dimension":384,"indexFullness":0,"totalVectorCount":12}"#,
        )?;

        assert_eq!(stats.total_vector_count, 12);
        assert_eq!(stats.namespaces["docs"].vector_count, 12);
        Ok(())
    }

    #[test]
    fn query_response_parses_matches() -> anyhow::Result<()> {
        let response: QueryResponse = serde_json::from_str(
            r#"{"matches":[{"id":"a","score":0.91,"values":[],"metadata":{"source":"a.pdf","page":0.0}}],"namespace":""}"#,
        )?;

        assert_eq!(response.matches.len(), 1);
        assert_eq!(response.matches[0].metadata["source"], "a.pdf");
        Ok(())
    }

    #[test]
    fn index_model_parses_status() -> anyhow::Result<()> {
        let model: IndexModel = serde_json::from_str(
            r#"{"name":"kb","dimension":384,"metric":"cosine","host":"kb-abc.svc.pinecone.io","spec":{"serverless":{"cloud":"aws","region":"us-east-1"}},"status":{"ready":true,"state":"Ready"}}"#,
        )?;

        assert!(model.status.ready);
        assert_eq!(model.metric, Metric::Cosine);
        Ok(())
    }
}
