//! Response bodies.

mod chat;
mod error_response;
mod index;
mod monitors;

pub use chat::{ChatExchange, ChatTranscript, ChatbotStatus};
pub use error_response::ErrorResponse;
pub use index::{IndexIngestion, IndexStatus};
pub use monitors::{HealthResponse, IndexSummary, ModelSummary, SessionSummary, StatusResponse};
