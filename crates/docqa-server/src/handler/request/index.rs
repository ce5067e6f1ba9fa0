use docqa_vector::PopulateOptions;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/index`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CreateIndex {
    /// Re-ingest even if the index already holds vectors.
    #[serde(default)]
    pub force: bool,
}

impl From<CreateIndex> for PopulateOptions {
    fn from(request: CreateIndex) -> Self {
        Self {
            force: request.force,
        }
    }
}
