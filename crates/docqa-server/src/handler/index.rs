//! Index inspection and creation handlers.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use docqa_core::config::keys;
use docqa_rig::RagService;

use super::request::CreateIndex;
use super::response::{IndexIngestion, IndexStatus};
use super::{Result, require_credentials};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{Json, Session};
use crate::service::ServiceState;

/// Index routes only need the vector store key.
fn require_index_credentials(rag: &RagService) -> Result<()> {
    let missing: Vec<String> = rag
        .missing_credentials()
        .into_iter()
        .filter(|key| key == keys::PINECONE_API_KEY)
        .collect();
    require_credentials(&missing)
}

async fn index_status(State(rag): State<RagService>) -> Result<Json<IndexStatus>> {
    require_index_credentials(&rag)?;

    let gateway = rag.gateway()?;
    let name = rag.index_name();
    let mut status = IndexStatus {
        name: name.to_owned(),
        backend: gateway.backend_name().to_owned(),
        exists: gateway.exists(name).await?,
        vector_count: None,
        dimension: None,
    };

    if status.exists {
        let stats = gateway.stats(name).await?;
        status.vector_count = Some(stats.vector_count);
        status.dimension = Some(stats.dimension);
    }

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        index = %status.name,
        exists = status.exists,
        "Index status checked"
    );

    Ok(Json(status))
}

async fn create_index(
    State(rag): State<RagService>,
    session: Session,
    request: Option<Json<CreateIndex>>,
) -> Result<Json<IndexIngestion>> {
    require_index_credentials(&rag)?;
    let request = request.map(Json::into_inner).unwrap_or_default();

    // One interaction per session at a time.
    let _guard = session.lock().await;

    tracing::info!(
        target: TRACING_TARGET_HANDLER,
        session = %session.id(),
        index = %rag.index_name(),
        force = request.force,
        "Index creation requested"
    );

    let report = rag.ingest(request.into()).await?;
    Ok(Json(report.into()))
}

/// Returns a [`Router`] with the index routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/api/index", get(index_status).post(create_index))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{create_test_app, create_unconfigured_app};

    #[tokio::test]
    async fn missing_index_is_reported() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.get("/api/index").await;
        response.assert_status_ok();
        let status = response.json::<IndexStatus>();
        assert!(!status.exists);
        assert_eq!(status.backend, "memory");
        assert!(status.vector_count.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_index_ingests_documents() -> anyhow::Result<()> {
        let app = create_test_app()?;
        app.write_pdf("handbook.pdf", &["Vacation is twenty days.", "Remote work is allowed."])?;

        let response = app.server.post("/api/index").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["files"], 1);
        assert_eq!(body["pages"], 2);
        assert!(body["chunks"].as_u64().is_some_and(|n| n >= 2));
        assert!(body["summary"].as_str().is_some_and(|s| s.contains("Created index")));

        let status = app.server.get("/api/index").await.json::<IndexStatus>();
        assert!(status.exists);
        assert_eq!(status.dimension, Some(384));
        assert!(status.vector_count.is_some_and(|n| n >= 2));
        Ok(())
    }

    #[tokio::test]
    async fn populated_index_is_skipped_unless_forced() -> anyhow::Result<()> {
        let app = create_test_app()?;
        app.write_pdf("handbook.pdf", &["Vacation is twenty days."])?;
        app.server.post("/api/index").await.assert_status_ok();

        let skipped: Value = app.server.post("/api/index").await.json();
        assert!(
            skipped["summary"]
                .as_str()
                .is_some_and(|s| s.contains("skipped ingestion"))
        );

        let forced = app
            .server
            .post("/api/index")
            .json(&json!({ "force": true }))
            .await;
        forced.assert_status_ok();
        let forced: Value = forced.json();
        assert_eq!(forced["outcome"], "populated");
        assert_eq!(forced["created"], false);
        Ok(())
    }

    #[tokio::test]
    async fn empty_data_directory_fails_without_creating() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.post("/api/index").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["name"], "document_load_failed");

        let status = app.server.get("/api/index").await.json::<IndexStatus>();
        assert!(!status.exists);
        Ok(())
    }

    #[tokio::test]
    async fn missing_pinecone_key_is_a_precondition_failure() -> anyhow::Result<()> {
        let app = create_unconfigured_app()?;

        let response = app.server.get("/api/index").await;
        response.assert_status(StatusCode::PRECONDITION_FAILED);
        let body: Value = response.json();
        assert_eq!(body["name"], "missing_credentials");
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.contains("PINECONE_API_KEY") && !m.contains("OPENAI"))
        );

        let response = app.server.post("/api/index").await;
        response.assert_status(StatusCode::PRECONDITION_FAILED);
        Ok(())
    }
}
