use docqa_rig::rag::Reply;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::ChatMessage;

/// Chatbot initialization result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotStatus {
    pub initialized: bool,
    pub index: String,
    pub k: usize,
}

/// The session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub session_id: Uuid,
    pub initialized: bool,
    pub messages: Vec<ChatMessage>,
}

/// One question and its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: ChatMessage,
    pub answer: ChatMessage,
    pub reply: Reply,
}
