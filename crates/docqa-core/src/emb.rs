//! Embedding model seam.

use async_trait::async_trait;

use crate::{Error, Result, TRACING_TARGET_EMBEDDING};

/// Default maximum number of texts sent in one embedding request.
pub const DEFAULT_MAX_BATCH: usize = 96;

/// A text embedding model producing fixed-dimension vectors.
///
/// Implementations must return exactly one vector of [`ndims`] components
/// per input text, in input order. Identical input against the same model
/// version yields identical vectors.
///
/// [`ndims`]: Embedder::ndims
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier.
    fn model_name(&self) -> &str;

    /// Returns the dimensionality of produced vectors.
    fn ndims(&self) -> usize;

    /// Returns the maximum number of texts accepted per request.
    fn max_batch(&self) -> usize {
        DEFAULT_MAX_BATCH
    }

    /// Embeds a batch of texts.
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Embeds a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_texts(vec![text.to_owned()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("model returned no vector"))
    }
}

/// Embeds `texts` in batches of at most `embedder.max_batch()` and checks
/// every returned vector against `embedder.ndims()`.
pub async fn embed_batched(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let batch_size = embedder.max_batch().max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        tracing::debug!(
            target: TRACING_TARGET_EMBEDDING,
            model = %embedder.model_name(),
            batch = batch_index,
            size = batch.len(),
            "Embedding batch"
        );

        let embedded = embedder.embed_texts(batch.to_vec()).await?;
        if embedded.len() != batch.len() {
            return Err(Error::embedding(format!(
                "expected {} vectors, got {}",
                batch.len(),
                embedded.len()
            )));
        }

        vectors.extend(embedded);
    }

    check_dimensions(embedder.ndims(), &vectors)?;
    Ok(vectors)
}

/// Fails if any vector's length differs from `ndims`.
pub fn check_dimensions(ndims: usize, vectors: &[Vec<f32>]) -> Result<()> {
    match vectors.iter().position(|v| v.len() != ndims) {
        Some(position) => Err(Error::embedding(format!(
            "vector {position} has {} dimensions, expected {ndims}",
            vectors[position].len()
        ))),
        None => Ok(()),
    }
}
