//! Language model seam.

use async_trait::async_trait;

use crate::Result;

/// A hosted language model that completes a single prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier.
    fn model_name(&self) -> &str;

    /// Returns the sampling temperature every request is sent with.
    fn temperature(&self) -> f64;

    /// Completes `prompt` and returns the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
