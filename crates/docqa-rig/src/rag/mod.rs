//! Retrieval-augmented answering.
//!
//! A question passes through these stages:
//!
//! ```text
//! Received → Embedded → Retrieved → Prompted → Generated → Formatted
//!     └──────────┴───────────┴──────────┴───────────┴──→ Failed
//! ```
//!
//! The question is embedded with the same model used at ingestion, the `k`
//! closest chunks fill the prompt template, and the completion is returned
//! together with deduplicated source citations.
//!
//! # Example
//!
//! ```ignore
//! let pipeline = service.pipeline()?;
//! let answer = pipeline.answer("What treats headaches?").await?;
//! println!("{}", answer.render());
//! ```

mod answer;
mod generator;
mod pipeline;
mod prompt;

pub use self::answer::{Answer, Reply, citation, citations};
pub use self::generator::GeneratorSlot;
pub use self::pipeline::{RagPipeline, Stage};
pub use self::prompt::{FALLBACK_ANSWER, PROMPT_TEMPLATE, build_prompt};
