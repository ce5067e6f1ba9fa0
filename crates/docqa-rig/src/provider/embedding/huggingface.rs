//! Hugging Face Inference API feature extraction.

use docqa_core::{Error, Result};
use reqwest::StatusCode;
use serde::Serialize;

/// Client for the `feature-extraction` pipeline of the Inference API.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

impl HuggingFaceEmbedder {
    /// Creates a client for `model` served under `base_url`.
    pub fn new(base_url: &str, model: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("docqa-rig/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config("cannot build Hugging Face client").with_source(e))?;

        let endpoint = format!(
            "{}/models/{model}/pipeline/feature-extraction",
            base_url.trim_end_matches('/')
        );

        Ok(Self {
            http,
            endpoint,
            model: model.to_owned(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Returns the request URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Embeds `texts`, one vector per input.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&FeatureExtractionRequest { inputs: texts });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding("huggingface request failed").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::config("huggingface rejected the API key")
                }
                _ => Error::embedding(format!("huggingface returned {status}")),
            };
            return Err(err.with_context(body));
        }

        response
            .json::<Vec<Vec<f32>>>()
            .await
            .map_err(|e| Error::embedding("unexpected huggingface response").with_source(e))
    }
}

impl std::fmt::Debug for HuggingFaceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceEmbedder")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
