//! Assistant session
//!
//! Owns the running conversation and the speech output for one connected
//! user. Turns are serialized so at most one generation is active.

use parking_lot::Mutex;
use std::sync::Arc;

use murshid_config::AssistantConfig;
use murshid_core::{Conversation, Result, Speaker, Utterance};

use crate::assistant::RagAssistant;

/// One user's voice session
pub struct AssistantSession {
    assistant: RagAssistant,
    speaker: Arc<dyn Speaker>,
    history: Mutex<Conversation>,
    turn: tokio::sync::Mutex<()>,
    greeting: String,
    allow_interruptions: bool,
}

impl AssistantSession {
    pub fn new(
        assistant: RagAssistant,
        speaker: Arc<dyn Speaker>,
        config: &AssistantConfig,
    ) -> Self {
        let history = Conversation::new(assistant.system_prompt());
        Self {
            assistant,
            speaker,
            history: Mutex::new(history),
            turn: tokio::sync::Mutex::new(()),
            greeting: config.greeting.clone(),
            allow_interruptions: config.allow_interruptions,
        }
    }

    /// Speak the greeting. It cannot be interrupted and is kept in history.
    pub async fn greet(&self) -> Result<()> {
        let _turn = self.turn.lock().await;

        let spoken = self
            .speaker
            .say(Utterance::text(self.greeting.clone()), false)
            .await?;
        self.history.lock().push_assistant(spoken);

        tracing::info!(model = %self.assistant.model_name(), "Session greeted user");
        Ok(())
    }

    /// Reply to a finished voice transcript.
    pub async fn handle_user_turn(&self, transcript: &str) -> Result<String> {
        if transcript.trim().is_empty() {
            tracing::debug!("Ignoring empty transcript");
            return Ok(String::new());
        }

        let _turn = self.turn.lock().await;

        let mut conversation = self.history.lock().clone().with_user_message(transcript);
        let stream = self.assistant.will_synthesize_reply(&mut conversation).await?;
        let spoken = self
            .speaker
            .say(Utterance::Stream(stream), self.allow_interruptions)
            .await?;

        self.record_exchange(transcript, &spoken);
        Ok(spoken)
    }

    /// Reply to a typed chat message.
    pub async fn handle_chat_message(&self, text: &str) -> Result<String> {
        let _turn = self.turn.lock().await;

        let history = self.history.lock().clone();
        let stream = self.assistant.answer_from_text(&history, text).await?;
        let spoken = self
            .speaker
            .say(Utterance::Stream(stream), self.allow_interruptions)
            .await?;

        self.record_exchange(text, &spoken);
        Ok(spoken)
    }

    /// Snapshot of the un-augmented conversation
    pub fn history(&self) -> Conversation {
        self.history.lock().clone()
    }

    // Only completed turns reach history, so a failed turn leaves no
    // dangling user message.
    fn record_exchange(&self, user: &str, assistant: &str) {
        let mut history = self.history.lock();
        history.push_user(user);
        history.push_assistant(assistant);
        tracing::debug!(messages = history.len(), "Turn recorded");
    }
}
