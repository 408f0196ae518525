//! Core traits and types for the Murshid assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation and chat-completion chunk types
//! - Collaborator traits (language model, retriever, speaker)
//! - Error types

pub mod conversation;
pub mod error;
pub mod llm_types;
pub mod traits;

pub use conversation::{Conversation, Message, Role};
pub use error::{Error, Result};
pub use llm_types::{ChatChunk, ChatStream, Choice, ChoiceDelta};

// Trait re-exports
pub use traits::{
    // LLM
    LanguageModel,
    RetrievedNode,
    // Retrieval
    Retriever,
    // Speech
    Speaker,
    Utterance,
};
