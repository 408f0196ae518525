//! Error types shared across crates

use thiserror::Error;

/// Result alias used by the collaborator traits
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech output error: {0}")]
    Speech(String),

    #[error("Text chat queue is full")]
    QueueFull,

    #[error("Channel closed")]
    ChannelClosed,
}
