//! Speech output traits

use async_trait::async_trait;

use crate::{ChatStream, Result};

/// Something the assistant can say
pub enum Utterance {
    /// Fixed text, e.g. the greeting
    Text(String),
    /// A chat-completion stream produced by a language model
    Stream(ChatStream),
}

impl Utterance {
    pub fn text(text: impl Into<String>) -> Self {
        Utterance::Text(text.into())
    }
}

impl std::fmt::Debug for Utterance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Utterance::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Utterance::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Speech output of the external voice session
///
/// Mirrors the session's `say`: it consumes text or a chat stream,
/// synthesizes it, and resolves once playback has been scheduled.
#[async_trait]
pub trait Speaker: Send + Sync + 'static {
    /// Speak the utterance and return the full text that was spoken.
    async fn say(&self, utterance: Utterance, allow_interruptions: bool) -> Result<String>;
}
