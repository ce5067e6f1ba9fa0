//! Single-page chat UI.

use axum::Router;
use axum::response::Html;
use axum::routing::get;

use crate::service::ServiceState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Returns a [`Router`] serving the UI.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/", get(index))
}

#[cfg(test)]
mod tests {
    use crate::handler::test::create_test_app;

    #[tokio::test]
    async fn serves_the_chat_page() -> anyhow::Result<()> {
        let app = create_test_app()?;

        let response = app.server.get("/").await;
        response.assert_status_ok();
        let page = response.text();
        assert!(page.contains("/api/chat"));
        assert!(page.contains("Initialize chatbot"));
        Ok(())
    }
}
