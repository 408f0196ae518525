//! Chat model adapter
//!
//! Bridges the single-shot `TextGenerator` to the core `LanguageModel`
//! trait. The voice session consumes chat streams, so each generation is
//! exposed as a stream of exactly one chunk.

use std::sync::Arc;

use murshid_config::constants::generation::REQUEST_ID;
use murshid_core::{ChatChunk, ChatStream, Conversation, LanguageModel};

use crate::backend::TextGenerator;
use crate::prompt::format_prompt;

/// Adapter that wraps a `TextGenerator` to implement `LanguageModel`.
///
/// # Example
///
/// ```ignore
/// let backend = WatsonxBackend::connect(config).await?;
/// let llm: Arc<dyn LanguageModel> = Arc::new(WatsonxChatModel::new(backend));
/// ```
pub struct WatsonxChatModel {
    generator: Arc<dyn TextGenerator>,
    model_name: String,
}

impl WatsonxChatModel {
    pub fn new<G: TextGenerator>(generator: G) -> Self {
        Self::from_arc(Arc::new(generator))
    }

    pub fn from_arc(generator: Arc<dyn TextGenerator>) -> Self {
        let model_name = generator.model_name().to_string();
        Self {
            generator,
            model_name,
        }
    }
}

impl LanguageModel for WatsonxChatModel {
    fn chat(&self, conversation: &Conversation) -> ChatStream {
        let prompt = format_prompt(conversation);
        tracing::debug!(
            messages = conversation.len(),
            prompt_chars = prompt.len(),
            "Formatted prompt"
        );
        tracing::trace!(prompt = %prompt, "Prompt body");

        let generator = self.generator.clone();

        // Nothing is sent until the first poll
        Box::pin(async_stream::stream! {
            let text = generator.generate(&prompt).await;
            yield Ok(ChatChunk::assistant(REQUEST_ID, text));
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
