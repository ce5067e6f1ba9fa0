//! Deterministic doubles for the embedding and language model seams.
//!
//! Enabled by the `test-utils` feature. Neither type performs I/O.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::emb::Embedder;
use crate::llm::Generator;
use crate::{Error, Result};

/// Bag-of-words hashing embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `ndims` buckets
/// and the result is L2-normalised, so texts sharing words have a positive
/// cosine similarity and identical texts have similarity 1.0.
#[derive(Debug)]
pub struct MockEmbedder {
    ndims: usize,
    max_batch: usize,
    calls: AtomicUsize,
    fail_with: Option<String>,
}

impl MockEmbedder {
    /// Creates an embedder producing `ndims`-dimensional vectors.
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims,
            max_batch: crate::emb::DEFAULT_MAX_BATCH,
            calls: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// Limits the batch size reported by [`Embedder::max_batch`].
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Makes every call fail with an embedding error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Returns how many times `embed_texts` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embeds one text synchronously.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.ndims];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_be_bytes(bucket) % self.ndims as u64) as usize;
            vector[index] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            vector[0] = 1.0;
        } else {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(Error::embedding(message.clone()));
        }

        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}

/// What [`MockGenerator`] answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Always the same text.
    Fixed(String),
    /// The `Context:` section of the prompt, verbatim.
    EchoContext,
    /// A generation error with this message.
    Fail(String),
}

/// Language model double that records every prompt it receives.
#[derive(Debug)]
pub struct MockGenerator {
    reply: MockReply,
    temperature: f64,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Creates a generator with the given reply behaviour.
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            temperature: crate::config::DEFAULT_LLM_TEMPERATURE,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a generator always answering `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockReply::Fixed(text.into()))
    }

    /// Creates a generator echoing the prompt context.
    pub fn echo_context() -> Self {
        Self::new(MockReply::EchoContext)
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn model_name(&self) -> &str {
        "mock-generator"
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_owned());
        }

        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::EchoContext => Ok(extract_context(prompt).to_owned()),
            MockReply::Fail(message) => Err(Error::generation(message.clone())),
        }
    }
}

fn extract_context(prompt: &str) -> &str {
    let Some((_, rest)) = prompt.split_once("Context: ") else {
        return "";
    };

    rest.split_once("\n\nQuestion:")
        .map_or(rest, |(context, _)| context)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn identical_text_has_unit_similarity() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.vector("Aspirin treats headaches.");
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_words_score_higher() {
        let embedder = MockEmbedder::new(384);
        let query = embedder.vector("What treats headaches?");
        let related = embedder.vector("Aspirin treats headaches.");
        let unrelated = embedder.vector("Insulin regulates glucose.");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn embedder_counts_calls_and_fails_on_demand() {
        let embedder = MockEmbedder::new(8).failing("offline");
        assert!(embedder.embed_texts(vec!["a".into()]).await.is_err());
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn generator_echoes_context() -> anyhow::Result<()> {
        let generator = MockGenerator::echo_context();
        let reply = generator
            .complete("Intro\n\nContext: Aspirin treats headaches.\n\nQuestion: Why?\n\nAnswer:")
            .await?;

        assert_eq!(reply, "Aspirin treats headaches.");
        assert_eq!(generator.prompts().len(), 1);
        Ok(())
    }
}
