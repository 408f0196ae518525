//! Murshid assistant process
//!
//! Loads settings, initializes observability, connects to watsonx.ai and
//! the knowledge index, and drives a console session standing in for the
//! external voice session.

pub mod bootstrap;
pub mod console;

pub use bootstrap::{build_assistant, build_session, init_metrics, init_tracing, read_system_prompt};
pub use console::{parse_command, Command, ConsoleSpeaker};

use thiserror::Error;

/// Startup errors. Any of these stops the process.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] murshid_config::ConfigError),

    #[error("Failed to read system prompt from {path}: {source}")]
    SystemPrompt {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Llm(#[from] murshid_llm::LlmError),

    #[error(transparent)]
    Rag(#[from] murshid_rag::RagError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}
