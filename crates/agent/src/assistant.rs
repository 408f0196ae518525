//! Retrieval-augmented reply generation
//!
//! Both entry points share one path: retrieve fragments for the latest user
//! message, rebuild the system message around them, then hand the
//! conversation to the language model.

use std::sync::Arc;

use murshid_config::constants::{prompts, rag};
use murshid_config::Settings;
use murshid_core::{ChatStream, Conversation, LanguageModel, Result, Retriever};
use murshid_rag::build_context_prompt;

/// Augmentation settings
#[derive(Debug, Clone)]
pub struct RagAssistantConfig {
    /// Fragments retrieved per turn
    pub top_k: usize,
    /// Continue without context when retrieval fails
    pub fail_open: bool,
    pub context_header: String,
    pub context_separator: String,
}

impl Default for RagAssistantConfig {
    fn default() -> Self {
        Self {
            top_k: rag::TOP_K,
            fail_open: true,
            context_header: prompts::CONTEXT_HEADER.to_string(),
            context_separator: prompts::CONTEXT_SEPARATOR.to_string(),
        }
    }
}

impl From<&Settings> for RagAssistantConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            top_k: settings.rag.top_k,
            fail_open: settings.rag.fail_open,
            context_header: settings.assistant.context_header.clone(),
            context_separator: settings.assistant.context_separator.clone(),
        }
    }
}

/// Per-turn orchestration of retrieval and generation
pub struct RagAssistant {
    llm: Arc<dyn LanguageModel>,
    retriever: Option<Arc<dyn Retriever>>,
    system_prompt: String,
    config: RagAssistantConfig,
}

impl RagAssistant {
    /// Assistant without retrieval; `system_prompt` is used as is.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        system_prompt: impl Into<String>,
        config: RagAssistantConfig,
    ) -> Self {
        Self {
            llm,
            retriever: None,
            system_prompt: system_prompt.into(),
            config,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// The un-augmented system prompt
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Rewrite the system message of `conversation` for the current turn.
    ///
    /// Element 0 is always rebuilt from the assistant's own system prompt,
    /// so a conversation kept across turns never accumulates context blocks.
    /// Without retrieved context the plain prompt is restored.
    pub async fn augment(&self, conversation: &mut Conversation) -> Result<()> {
        let Some(query) = conversation.last_user().map(|m| m.content.clone()) else {
            tracing::debug!("No user message in conversation, skipping retrieval");
            conversation.replace_system(self.system_prompt.as_str());
            return Ok(());
        };

        let Some(retriever) = &self.retriever else {
            conversation.replace_system(self.system_prompt.as_str());
            return Ok(());
        };

        let nodes = match retriever.retrieve(&query, self.config.top_k).await {
            Ok(nodes) => {
                metrics::counter!("murshid_retrieval_total", "outcome" => "ok").increment(1);
                tracing::debug!(
                    retriever = retriever.name(),
                    fragments = nodes.len(),
                    "Retrieved context"
                );
                nodes
            }
            Err(e) if self.config.fail_open => {
                metrics::counter!("murshid_retrieval_total", "outcome" => "error").increment(1);
                tracing::warn!(
                    error = %e,
                    "Retrieval failed, continuing with the plain system prompt"
                );
                conversation.replace_system(self.system_prompt.as_str());
                return Ok(());
            }
            Err(e) => {
                metrics::counter!("murshid_retrieval_total", "outcome" => "error").increment(1);
                tracing::error!(error = %e, "Retrieval failed");
                return Err(e);
            }
        };

        let system = build_context_prompt(
            &self.config.context_header,
            &nodes,
            &self.config.context_separator,
            &self.system_prompt,
        );
        conversation.replace_system(system);
        Ok(())
    }

    /// Voice turn hook: augment `conversation` in place and start the reply.
    pub async fn will_synthesize_reply(
        &self,
        conversation: &mut Conversation,
    ) -> Result<ChatStream> {
        self.augment(conversation).await?;
        Ok(self.llm.chat(conversation))
    }

    /// Typed chat: answer `text` on a copy of `history`.
    pub async fn answer_from_text(
        &self,
        history: &Conversation,
        text: &str,
    ) -> Result<ChatStream> {
        let mut conversation = history.clone().with_user_message(text);
        self.will_synthesize_reply(&mut conversation).await
    }
}
