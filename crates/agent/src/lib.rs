//! Assistant orchestration
//!
//! Features:
//! - Retrieval-augmented reply generation shared by voice and typed turns
//! - Per-user session with serialized turns and conversation history
//! - Bounded queue for typed chat messages

pub mod assistant;
pub mod session;
pub mod text_chat;

pub use assistant::{RagAssistant, RagAssistantConfig};
pub use session::AssistantSession;
pub use text_chat::TextChatQueue;
