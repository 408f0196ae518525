//! watsonx.ai integration
//!
//! Features:
//! - IAM API-key exchange for a bearer token, refreshed near expiry
//! - Single-shot text generation with a "never hard-fail a turn" policy
//! - Llama-style instruction prompt formatting
//! - Chat adapter exposing each generation as a one-chunk stream

pub mod adapter;
pub mod backend;
pub mod prompt;
pub mod token;

pub use adapter::WatsonxChatModel;
pub use backend::{
    DecodingMethod, GenerationParameters, LlmConfig, TextGenerator, WatsonxBackend,
};
pub use prompt::{format_prompt, wrap_instruction};
pub use token::{AccessToken, IamTokenProvider};

use thiserror::Error;

/// LLM errors
///
/// Display strings are what a degraded turn speaks, so they stay readable.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API request failed - {0}")]
    Network(String),

    #[error("Non-200 response: {status} {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for murshid_core::Error {
    fn from(err: LlmError) -> Self {
        murshid_core::Error::Llm(err.to_string())
    }
}
