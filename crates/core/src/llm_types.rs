//! Chat-completion stream types
//!
//! Shapes follow the usual streaming chat-completion layout: a chunk carries
//! a request id and a list of choices, each with a role/content delta.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::{Result, Role};

/// Stream of chat chunks handed to the voice session
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send + 'static>>;

/// One unit of a streaming chat-completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub request_id: String,
    pub choices: Vec<Choice>,
}

/// A single choice within a chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub delta: ChoiceDelta,
    pub index: usize,
}

/// Incremental content for a choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDelta {
    pub role: Role,
    pub content: String,
}

impl ChatChunk {
    /// Chunk carrying the full assistant reply as choice 0
    pub fn assistant(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            choices: vec![Choice {
                delta: ChoiceDelta {
                    role: Role::Assistant,
                    content: content.into(),
                },
                index: 0,
            }],
        }
    }

    /// Concatenated content of all choices
    pub fn content(&self) -> String {
        self.choices.iter().map(|c| c.delta.content.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_chunk_shape() {
        let chunk = ChatChunk::assistant("req-1", "Hi there");
        assert_eq!(chunk.request_id, "req-1");
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].index, 0);
        assert_eq!(chunk.choices[0].delta.role, Role::Assistant);
        assert_eq!(chunk.content(), "Hi there");
    }
}
