//! Chatbot initialization and chat transcript handlers.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use docqa_rig::RagService;

use super::request::AskQuestion;
use super::response::{ChatExchange, ChatTranscript, ChatbotStatus};
use super::{ErrorKind, Result, require_credentials};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{Json, Session};
use crate::service::{ChatMessage, ServiceState, SessionData};

fn transcript(session: &Session, data: &SessionData) -> ChatTranscript {
    ChatTranscript {
        session_id: session.id(),
        initialized: data.is_initialized(),
        messages: data.messages().to_vec(),
    }
}

async fn init_chatbot(
    State(rag): State<RagService>,
    session: Session,
) -> Result<Json<ChatbotStatus>> {
    require_credentials(&rag.missing_credentials())?;

    let mut data = session.lock().await;
    if !rag.index_populated().await? {
        return Err(ErrorKind::IndexNotFound.with_context(format!(
            "index '{}' has not been created or holds no vectors",
            rag.index_name()
        )));
    }

    let chatbot = rag.pipeline()?;
    let status = ChatbotStatus {
        initialized: true,
        index: chatbot.index_name().to_owned(),
        k: chatbot.k(),
    };
    data.set_chatbot(chatbot);

    tracing::info!(
        target: TRACING_TARGET_HANDLER,
        session = %session.id(),
        index = %status.index,
        k = status.k,
        "Chatbot initialized"
    );

    Ok(Json(status))
}

async fn get_transcript(session: Session) -> Json<ChatTranscript> {
    let data = session.lock().await;
    Json(transcript(&session, &data))
}

async fn ask_question(
    session: Session,
    Json(request): Json<AskQuestion>,
) -> Result<Json<ChatExchange>> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("The question must not be empty"));
    }

    let mut data = session.lock().await;
    let Some(chatbot) = data.chatbot().cloned() else {
        return Err(ErrorKind::ChatbotNotInitialized.into_error());
    };

    let question = ChatMessage::user(question);
    data.push(question.clone());

    let reply = chatbot.respond(&question.content).await;
    let answer = ChatMessage::assistant(&reply);
    data.push(answer.clone());

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        session = %session.id(),
        failed = reply.failed,
        messages = data.messages().len(),
        "Question answered"
    );

    Ok(Json(ChatExchange {
        question,
        answer,
        reply,
    }))
}

async fn clear_transcript(session: Session) -> Json<ChatTranscript> {
    let mut data = session.lock().await;
    data.clear();
    Json(transcript(&session, &data))
}

/// Returns a [`Router`] with the chat routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/chatbot", post(init_chatbot))
        .route(
            "/api/chat",
            get(get_transcript).post(ask_question).delete(clear_transcript),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use docqa_core::config::DEFAULT_INDEX_NAME;
    use docqa_vector::memory::MemoryBackend;
    use docqa_vector::{Metric, VectorStoreBackend};

    use super::*;
    use crate::handler::test::{
        TestApp, create_test_app, create_test_app_with_backend, create_unconfigured_app,
    };
    use crate::service::Role;

    async fn ready_app() -> anyhow::Result<TestApp> {
        let app = create_test_app()?;
        app.write_pdf("handbook.pdf", &["Vacation is twenty days per year."])?;
        app.server.post("/api/index").await.assert_status_ok();
        app.server.post("/api/chatbot").await.assert_status_ok();
        Ok(app)
    }

    #[tokio::test]
    async fn chatbot_requires_an_index() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.post("/api/chatbot").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["name"], "index_not_found");
        Ok(())
    }

    #[tokio::test]
    async fn chatbot_requires_a_populated_index() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend
            .create_index(DEFAULT_INDEX_NAME, 384, Metric::Cosine)
            .await?;
        let app = create_test_app_with_backend(backend)?;

        let response = app.server.post("/api/chatbot").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["name"], "index_not_found");
        Ok(())
    }

    #[tokio::test]
    async fn chatbot_requires_credentials() -> anyhow::Result<()> {
        let app = create_unconfigured_app()?;

        let response = app.server.post("/api/chatbot").await;
        response.assert_status(StatusCode::PRECONDITION_FAILED);
        let body: Value = response.json();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.contains("PINECONE_API_KEY"));
        assert!(message.contains("OPENAI_API_KEY"));
        Ok(())
    }

    #[tokio::test]
    async fn questions_need_an_initialized_chatbot() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app
            .server
            .post("/api/chat")
            .json(&json!({ "question": "How long is vacation?" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let transcript = app.server.get("/api/chat").await.json::<ChatTranscript>();
        assert!(transcript.messages.is_empty());
        assert!(!transcript.initialized);
        Ok(())
    }

    #[tokio::test]
    async fn answers_cite_their_sources() -> anyhow::Result<()> {
        let app = ready_app().await?;

        let response = app
            .server
            .post("/api/chat")
            .json(&json!({ "question": "How long is vacation?" }))
            .await;
        response.assert_status_ok();
        let exchange = response.json::<ChatExchange>();

        assert!(!exchange.reply.failed);
        assert!(exchange.reply.content.contains("Vacation is twenty days"));
        assert!(exchange.reply.content.ends_with("**Sources:** handbook.pdf (page 0)"));
        assert_eq!(exchange.question.role, Role::User);
        assert_eq!(exchange.answer.content, exchange.reply.content);

        let transcript = app.server.get("/api/chat").await.json::<ChatTranscript>();
        assert!(transcript.initialized);
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[1].role, Role::Assistant);
        Ok(())
    }

    #[tokio::test]
    async fn blank_questions_are_rejected_and_not_recorded() -> anyhow::Result<()> {
        let app = ready_app().await?;

        let response = app
            .server
            .post("/api/chat")
            .json(&json!({ "question": "   " }))
            .await;
        response.assert_status_bad_request();

        let transcript = app.server.get("/api/chat").await.json::<ChatTranscript>();
        assert!(transcript.messages.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() -> anyhow::Result<()> {
        let app = ready_app().await?;

        let response = app
            .server
            .post("/api/chat")
            .json(&json!({ "text": "wrong field" }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["name"], "bad_request");
        Ok(())
    }

    #[tokio::test]
    async fn clearing_keeps_the_chatbot() -> anyhow::Result<()> {
        let app = ready_app().await?;
        app.server
            .post("/api/chat")
            .json(&json!({ "question": "How long is vacation?" }))
            .await
            .assert_status_ok();

        let cleared = app.server.delete("/api/chat").await.json::<ChatTranscript>();
        assert!(cleared.messages.is_empty());
        assert!(cleared.initialized);

        app.server
            .post("/api/chat")
            .json(&json!({ "question": "Again?" }))
            .await
            .assert_status_ok();
        Ok(())
    }
}
