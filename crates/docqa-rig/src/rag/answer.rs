//! Answers, citations and chat replies.

use std::collections::HashSet;

use docqa_core::Error;
use docqa_vector::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Citation label for chunks without a recorded source.
pub const UNKNOWN_SOURCE: &str = "Unknown source";

/// A generated answer with its supporting chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text.
    pub text: String,
    /// Deduplicated citations in retrieval order.
    pub citations: Vec<String>,
    /// Retrieved chunks, best first.
    pub sources: Vec<ScoredChunk>,
}

impl Answer {
    /// Creates an answer, deriving citations from `sources`.
    pub fn new(text: impl Into<String>, sources: Vec<ScoredChunk>) -> Self {
        Self {
            text: text.into(),
            citations: citations(&sources),
            sources,
        }
    }

    /// Renders the answer followed by a `**Sources:**` line when any exist.
    pub fn render(&self) -> String {
        if self.citations.is_empty() {
            return self.text.clone();
        }

        format!("{}\n\n**Sources:** {}", self.text, self.citations.join(", "))
    }
}

/// Formats one citation as `"{source} (page {n})"`.
pub fn citation(chunk: &ScoredChunk) -> String {
    let source = chunk.source_path.as_deref().unwrap_or(UNKNOWN_SOURCE);
    match chunk.page_number {
        Some(page) => format!("{source} (page {page})"),
        None => source.to_owned(),
    }
}

/// Returns citations for `sources`, first occurrence wins.
pub fn citations(sources: &[ScoredChunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .map(citation)
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// What the chat front end shows for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Rendered answer or error text.
    pub content: String,
    /// Whether the pipeline failed.
    pub failed: bool,
}

impl Reply {
    /// Reply rendering a successful answer.
    pub fn answered(answer: &Answer) -> Self {
        Self {
            content: answer.render(),
            failed: false,
        }
    }

    /// Reply describing a failure.
    pub fn failed(err: &Error) -> Self {
        Self {
            content: format!("Error generating response: {err}"),
            failed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(source: Option<&str>, page: Option<u32>) -> ScoredChunk {
        ScoredChunk {
            id: format!("{source:?}-{page:?}"),
            score: 0.5,
            source_path: source.map(str::to_owned),
            page_number: page,
            text: "text".to_owned(),
        }
    }

    #[test]
    fn formats_citations() {
        assert_eq!(citation(&scored(Some("a.pdf"), Some(0))), "a.pdf (page 0)");
        assert_eq!(citation(&scored(Some("a.pdf"), None)), "a.pdf");
        assert_eq!(citation(&scored(None, Some(2))), "Unknown source (page 2)");
    }

    #[test]
    fn deduplicates_in_order() {
        let sources = vec![
            scored(Some("b.pdf"), Some(1)),
            scored(Some("a.pdf"), Some(0)),
            scored(Some("b.pdf"), Some(1)),
        ];
        assert_eq!(citations(&sources), vec!["b.pdf (page 1)", "a.pdf (page 0)"]);
    }

    #[test]
    fn renders_sources_line() {
        let answer = Answer::new("Aspirin.", vec![scored(Some("a.pdf"), Some(0))]);
        assert_eq!(answer.render(), "Aspirin.\n\n**Sources:** a.pdf (page 0)");

        let bare = Answer::new("I don't know.", Vec::new());
        assert_eq!(bare.render(), "I don't know.");
    }

    #[test]
    fn failed_reply_prefixes_error() {
        let reply = Reply::failed(&Error::generation("timeout"));
        assert!(reply.failed);
        assert!(reply.content.starts_with("Error generating response: "));
        assert!(reply.content.contains("timeout"));
    }
}
