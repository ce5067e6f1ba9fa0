//! Request bodies.

mod chat;
mod index;

pub use chat::AskQuestion;
pub use index::CreateIndex;
