//! Liveness and status handlers.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use docqa_rig::RagService;
use jiff::Timestamp;

use super::response::{HealthResponse, IndexSummary, ModelSummary, SessionSummary, StatusResponse};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{Json, Session};
use crate::service::{ServiceState, Uptime};

async fn health(State(uptime): State<Uptime>) -> Json<HealthResponse> {
    Json(HealthResponse {
        is_healthy: true,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        started_at: uptime.started_at(),
        uptime_secs: uptime.elapsed_secs(),
        updated_at: Timestamp::now(),
    })
}

/// Inspects the index, reporting failures as text.
async fn index_summary(rag: &RagService) -> IndexSummary {
    let mut summary = IndexSummary {
        name: rag.index_name().to_owned(),
        backend: None,
        exists: None,
        vector_count: None,
        error: None,
    };

    let gateway = match rag.gateway() {
        Ok(gateway) => gateway,
        Err(err) => {
            summary.error = Some(err.to_string());
            return summary;
        }
    };
    summary.backend = Some(gateway.backend_name().to_owned());

    match gateway.exists(rag.index_name()).await {
        Ok(true) => {
            summary.exists = Some(true);
            match gateway.stats(rag.index_name()).await {
                Ok(stats) => summary.vector_count = Some(stats.vector_count),
                Err(err) => summary.error = Some(err.to_string()),
            }
        }
        Ok(false) => summary.exists = Some(false),
        Err(err) => summary.error = Some(err.to_string()),
    }

    if let Some(error) = &summary.error {
        tracing::debug!(
            target: TRACING_TARGET_HANDLER,
            index = %summary.name,
            error = %error,
            "Index status unavailable"
        );
    }

    summary
}

async fn status(State(rag): State<RagService>, session: Session) -> Json<StatusResponse> {
    let index = index_summary(&rag).await;

    let settings = rag.settings();
    let models = ModelSummary {
        embedding_model: rag.embedder().model_name().to_owned(),
        embedding_dimensions: rag.embedder().ndims(),
        completion_model: settings.llm.model.clone(),
        completion_ready: rag.generator().is_ready(),
        retriever_k: settings.retriever_k,
    };

    let data = session.lock().await;
    let summary = SessionSummary {
        id: session.id(),
        initialized: data.is_initialized(),
        messages: data.messages().len(),
    };

    Json(StatusResponse {
        credentials: rag.credentials(),
        missing_credentials: rag.missing_credentials(),
        index,
        models,
        session: summary,
    })
}

/// Returns a [`Router`] with the monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test::{create_test_app, create_unconfigured_app};

    #[tokio::test]
    async fn health_reports_uptime() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.get("/api/health").await;
        response.assert_status_ok();
        let health = response.json::<HealthResponse>();
        assert!(health.is_healthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert!(health.started_at <= health.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn status_describes_a_fresh_setup() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.get("/api/status").await;
        response.assert_status_ok();
        let status = response.json::<StatusResponse>();

        assert!(status.missing_credentials.is_empty());
        assert_eq!(status.index.backend.as_deref(), Some("memory"));
        assert_eq!(status.index.exists, Some(false));
        assert_eq!(status.models.embedding_dimensions, 384);
        assert!(status.models.completion_ready);
        assert!(!status.session.initialized);
        assert_eq!(status.session.messages, 0);
        Ok(())
    }

    #[tokio::test]
    async fn status_reports_missing_credentials_as_text() -> anyhow::Result<()> {
        let app = create_unconfigured_app()?;

        let response = app.server.get("/api/status").await;
        response.assert_status_ok();
        let status = response.json::<StatusResponse>();

        assert_eq!(
            status.missing_credentials,
            vec!["PINECONE_API_KEY".to_owned(), "OPENAI_API_KEY".to_owned()]
        );
        assert!(status.credentials.iter().all(|c| !c.configured));
        assert!(status.index.backend.is_none());
        assert!(
            status
                .index
                .error
                .as_deref()
                .is_some_and(|e| e.contains("PINECONE_API_KEY"))
        );
        assert!(!status.models.completion_ready);
        Ok(())
    }
}
