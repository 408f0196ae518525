//! Conversation types
//!
//! A conversation is an ordered list of messages whose first element is
//! always the system message. Callers may swap that element before each
//! generation call to inject retrieved context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[serde(alias = "human")]
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat history, system message first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConversation")]
pub struct Conversation {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct RawConversation {
    messages: Vec<Message>,
}

impl TryFrom<RawConversation> for Conversation {
    type Error = String;

    fn try_from(raw: RawConversation) -> Result<Self, Self::Error> {
        match raw.messages.first().map(|m| m.role) {
            Some(Role::System) => Ok(Self {
                messages: raw.messages,
            }),
            Some(role) => Err(format!(
                "conversation must start with a system message, found {}",
                role
            )),
            None => Err("conversation must start with a system message".to_string()),
        }
    }
}

impl Conversation {
    /// Start a conversation from its system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Builder form of [`Conversation::push_user`]
    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.push_user(content);
        self
    }

    /// Builder form of [`Conversation::push_assistant`]
    pub fn with_assistant_message(mut self, content: impl Into<String>) -> Self {
        self.push_assistant(content);
        self
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system message (element 0)
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// Replace element 0. The replacement is always stored with the system role.
    pub fn replace_system(&mut self, content: impl Into<String>) {
        self.messages[0] = Message::system(content);
    }

    /// Most recent user message, if any
    pub fn last_user(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Number of messages, including the system message
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A conversation always holds its system message, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
