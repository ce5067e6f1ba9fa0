use docqa_core::config::CredentialStatus;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub is_healthy: bool,
    pub version: String,
    pub started_at: Timestamp,
    pub uptime_secs: u64,
    pub updated_at: Timestamp,
}

/// Index section of [`StatusResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub name: String,
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_count: Option<u64>,
    /// Why the index could not be inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Model section of [`StatusResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub completion_model: String,
    pub completion_ready: bool,
    pub retriever_k: usize,
}

/// Session section of [`StatusResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub initialized: bool,
    pub messages: usize,
}

/// Everything the sidebar shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub credentials: Vec<CredentialStatus>,
    pub missing_credentials: Vec<String>,
    pub index: IndexSummary,
    pub models: ModelSummary,
    pub session: SessionSummary,
}
