//! Core traits for the assistant
//!
//! Every external collaborator is reached through one of these traits so
//! backends can be swapped and mocked in tests.
//!
//! ```text
//! Language Models:
//!   - LanguageModel: conversation -> chat chunk stream
//!
//! Retrieval:
//!   - Retriever: query -> scored document fragments
//!
//! Speech:
//!   - Speaker: the voice session's `say`, fed text or a chat stream
//! ```

mod llm;
mod retriever;
mod speech;

pub use llm::LanguageModel;
pub use retriever::{RetrievedNode, Retriever};
pub use speech::{Speaker, Utterance};
