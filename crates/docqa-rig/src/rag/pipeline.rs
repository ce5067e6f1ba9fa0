//! Per-question pipeline.

use std::sync::Arc;

use docqa_core::{Embedder, Error, Result};
use docqa_vector::IndexGateway;
use strum::{AsRefStr, Display};

use super::answer::{Answer, Reply};
use super::generator::GeneratorSlot;
use super::prompt::{FALLBACK_ANSWER, build_prompt};
use crate::TRACING_TARGET_RAG;

/// Stage a question has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Received,
    Embedded,
    Retrieved,
    Prompted,
    Generated,
    Formatted,
    Failed,
}

/// Answers questions against a populated index.
///
/// Cheap to clone; clones share the embedder, index and model.
#[derive(Clone)]
pub struct RagPipeline {
    inner: Arc<RagPipelineInner>,
}

struct RagPipelineInner {
    gateway: IndexGateway,
    embedder: Arc<dyn Embedder>,
    generator: GeneratorSlot,
    index_name: String,
    k: usize,
}

impl RagPipeline {
    /// Creates a pipeline retrieving `k` chunks from `index_name`.
    pub fn new(
        gateway: IndexGateway,
        embedder: Arc<dyn Embedder>,
        generator: GeneratorSlot,
        index_name: impl Into<String>,
        k: usize,
    ) -> Result<Self> {
        if k == 0 {
            return Err(Error::invalid_input("retriever k must be at least 1"));
        }

        Ok(Self {
            inner: Arc::new(RagPipelineInner {
                gateway,
                embedder,
                generator,
                index_name: index_name.into(),
                k,
            }),
        })
    }

    /// Returns the queried index name.
    pub fn index_name(&self) -> &str {
        &self.inner.index_name
    }

    /// Returns the number of retrieved chunks per question.
    pub fn k(&self) -> usize {
        self.inner.k
    }

    /// Answers `question` with citations.
    ///
    /// Errors carry the failed stage in their context. A blank question is
    /// `InvalidInput`; a missing model credential is `Config` and no provider
    /// is contacted.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let inner = &self.inner;
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_input("question must not be empty"));
        }

        let generator = inner.generator.require()?;
        self.trace(Stage::Received);

        let vector = inner
            .embedder
            .embed_text(question)
            .await
            .map_err(|e| self.fail(Stage::Embedded, e))?;
        self.trace(Stage::Embedded);

        let sources = inner
            .gateway
            .query(&inner.index_name, &vector, inner.k)
            .await
            .map_err(|e| self.fail(Stage::Retrieved, e))?;
        tracing::debug!(
            target: TRACING_TARGET_RAG,
            stage = %Stage::Retrieved,
            index = %inner.index_name,
            retrieved = sources.len(),
            "Retrieved context"
        );

        let prompt = build_prompt(&sources, question);
        self.trace(Stage::Prompted);

        let completion = generator
            .complete(&prompt)
            .await
            .map_err(|e| self.fail(Stage::Generated, e))?;
        self.trace(Stage::Generated);

        let text = match completion.trim() {
            "" => FALLBACK_ANSWER.to_owned(),
            text => text.to_owned(),
        };
        let answer = Answer::new(text, sources);

        tracing::info!(
            target: TRACING_TARGET_RAG,
            stage = %Stage::Formatted,
            model = %generator.model_name(),
            citations = answer.citations.len(),
            "Answered question"
        );

        Ok(answer)
    }

    /// Answers `question`, folding any failure into the reply text.
    pub async fn respond(&self, question: &str) -> Reply {
        match self.answer(question).await {
            Ok(answer) => Reply::answered(&answer),
            Err(err) => Reply::failed(&err),
        }
    }

    fn trace(&self, stage: Stage) {
        tracing::debug!(target: TRACING_TARGET_RAG, stage = %stage, "Pipeline stage reached");
    }

    fn fail(&self, stage: Stage, err: Error) -> Error {
        tracing::warn!(
            target: TRACING_TARGET_RAG,
            stage = %Stage::Failed,
            during = %stage,
            error = %err,
            "Pipeline failed"
        );
        err.with_context(format!("stage: {stage}"))
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("index", &self.inner.index_name)
            .field("k", &self.inner.k)
            .field("embedder", &self.inner.embedder.model_name())
            .field("generator", &self.inner.generator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::ErrorKind;
    use docqa_core::mock::{MockEmbedder, MockGenerator};
    use docqa_core::{Chunk, DocumentPage};
    use docqa_vector::PopulateOptions;
    use docqa_vector::memory::MemoryBackend;

    use super::*;

    const INDEX: &str = "medical-knowledge-base";

    fn chunk(text: &str, source: &str, page: u32) -> Chunk {
        Chunk::new(&DocumentPage::new(text, source, page), text, 0, 0)
    }

    async fn populated(embedder: &MockEmbedder) -> anyhow::Result<IndexGateway> {
        let gateway = IndexGateway::new(MemoryBackend::new());
        let chunks = vec![
            chunk("Aspirin treats headaches.", "guide.pdf", 0),
            chunk("Insulin regulates blood sugar.", "guide.pdf", 1),
            chunk("Aspirin thins the blood.", "notes.pdf", 4),
        ];
        gateway
            .create_and_populate(INDEX, &chunks, embedder, PopulateOptions::default())
            .await?;
        Ok(gateway)
    }

    #[tokio::test]
    async fn answers_with_citations() -> anyhow::Result<()> {
        let embedder = Arc::new(MockEmbedder::default());
        let gateway = populated(&embedder).await?;
        let generator = GeneratorSlot::ready(MockGenerator::echo_context());
        let rag = RagPipeline::new(gateway, embedder, generator, INDEX, 1)?;

        let answer = rag.answer("What treats headaches?").await?;
        assert!(answer.text.contains("Aspirin treats headaches."));
        assert_eq!(answer.citations, vec!["guide.pdf (page 0)"]);
        assert!(answer.render().ends_with("**Sources:** guide.pdf (page 0)"));
        Ok(())
    }

    #[tokio::test]
    async fn prompt_carries_retrieved_context() -> anyhow::Result<()> {
        let embedder = Arc::new(MockEmbedder::default());
        let gateway = populated(&embedder).await?;
        let generator = Arc::new(MockGenerator::fixed("Aspirin."));
        let slot = GeneratorSlot::Ready(generator.clone());
        let rag = RagPipeline::new(gateway, embedder, slot, INDEX, 3)?;

        let answer = rag.answer("  What does aspirin do?  ").await?;
        assert_eq!(answer.text, "Aspirin.");
        assert_eq!(answer.sources.len(), 3);
        assert_eq!(answer.citations.len(), 3);

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: What does aspirin do?\n\nAnswer:"));
        assert!(prompts[0].contains("Aspirin thins the blood."));
        Ok(())
    }

    #[tokio::test]
    async fn blank_completion_uses_fallback() -> anyhow::Result<()> {
        let embedder = Arc::new(MockEmbedder::default());
        let gateway = populated(&embedder).await?;
        let slot = GeneratorSlot::ready(MockGenerator::fixed("   "));
        let rag = RagPipeline::new(gateway, embedder, slot, INDEX, 1)?;

        let answer = rag.answer("Anything?").await?;
        assert_eq!(answer.text, FALLBACK_ANSWER);
        Ok(())
    }

    #[tokio::test]
    async fn missing_model_fails_before_embedding() -> anyhow::Result<()> {
        let embedder = Arc::new(MockEmbedder::default());
        let gateway = populated(&embedder).await?;
        let calls_after_ingest = embedder.calls();
        let slot = GeneratorSlot::Missing("OPENAI_API_KEY".to_owned());
        let rag = RagPipeline::new(gateway, embedder.clone(), slot, INDEX, 3)?;

        let err = rag.answer("What treats headaches?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(embedder.calls(), calls_after_ingest);

        let reply = rag.respond("What treats headaches?").await;
        assert!(reply.failed);
        assert!(reply.content.starts_with("Error generating response:"));
        assert!(reply.content.contains("OPENAI_API_KEY"));
        Ok(())
    }

    #[tokio::test]
    async fn blank_question_is_rejected() -> anyhow::Result<()> {
        let gateway = IndexGateway::new(MemoryBackend::new());
        let slot = GeneratorSlot::ready(MockGenerator::fixed("x"));
        let rag = RagPipeline::new(gateway, Arc::new(MockEmbedder::default()), slot, INDEX, 3)?;

        let err = rag.answer(" \n ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    }

    #[tokio::test]
    async fn failures_carry_their_stage() -> anyhow::Result<()> {
        let gateway = IndexGateway::new(MemoryBackend::new());
        let slot = GeneratorSlot::ready(MockGenerator::fixed("x"));

        let rag = RagPipeline::new(
            gateway.clone(),
            Arc::new(MockEmbedder::default()),
            slot.clone(),
            INDEX,
            3,
        )?;
        let err = rag.answer("Where is the index?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexNotFound);
        assert_eq!(err.context(), Some("stage: retrieved"));

        let failing = Arc::new(MockEmbedder::default().failing("provider down"));
        let rag = RagPipeline::new(gateway, failing, slot, INDEX, 3)?;
        let err = rag.answer("Hello?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert_eq!(err.context(), Some("stage: embedded"));
        Ok(())
    }

    #[test]
    fn rejects_zero_k() {
        let err = RagPipeline::new(
            IndexGateway::new(MemoryBackend::new()),
            Arc::new(MockEmbedder::new(8)),
            GeneratorSlot::Missing("OPENAI_API_KEY".to_owned()),
            INDEX,
            0,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
