use docqa_rig::ingest::IngestReport;
use serde::{Deserialize, Serialize};

/// Existence and size of the configured index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub name: String,
    pub backend: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

/// Result of an index build request.
#[derive(Debug, Clone, Serialize)]
pub struct IndexIngestion {
    /// Human readable summary.
    pub summary: String,
    #[serde(flatten)]
    pub report: IngestReport,
}

impl From<IngestReport> for IndexIngestion {
    fn from(report: IngestReport) -> Self {
        Self {
            summary: report.summary(),
            report,
        }
    }
}
