//! Prompt construction.

use docqa_vector::ScoredChunk;

/// Question-answering prompt with `{context}` and `{question}` slots.
pub const PROMPT_TEMPLATE: &str = "You are an assistant for question-answering task. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know the answer. \
Use three sentences maximum and keep the answer concise.\n\n\
Context: {context}\n\n\
Question: {question}\n\n\
Answer:";

/// Returned when the model produces an empty completion.
pub const FALLBACK_ANSWER: &str = "Sorry, I could not generate a response.";

/// Fills the template with the retrieved chunk texts and the question.
///
/// Chunk texts are joined with blank lines, best match first. Slots are only
/// recognized in the template itself, never inside the substituted text.
pub fn build_prompt(sources: &[ScoredChunk], question: &str) -> String {
    let context = sources
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            prompt.push_str(&context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            prompt.push_str(question);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk {
            id: text.to_owned(),
            score: 1.0,
            source_path: None,
            page_number: None,
            text: text.to_owned(),
        }
    }

    #[test]
    fn fills_context_and_question() {
        let prompt = build_prompt(&[chunk("first"), chunk("second")], "Why?");

        assert!(prompt.starts_with("You are an assistant for question-answering task."));
        assert!(prompt.contains("Context: first\n\nsecond\n\nQuestion: Why?\n\nAnswer:"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn slot_names_in_chunks_are_kept_verbatim() {
        let prompt = build_prompt(
            &[chunk("Template literal {question} and {context} in a PDF")],
            "Q?",
        );

        assert!(prompt.contains("Context: Template literal {question} and {context} in a PDF\n\n"));
        assert!(prompt.contains("Question: Q?\n\nAnswer:"));
        assert_eq!(prompt.matches("Q?").count(), 1);
    }

    #[test]
    fn empty_context_still_asks() {
        let prompt = build_prompt(&[], "Anything?");
        assert!(prompt.contains("Context: \n\nQuestion: Anything?"));
    }
}
