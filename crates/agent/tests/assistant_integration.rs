//! End-to-end turn handling with the watsonx chat adapter over a scripted
//! generator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use murshid_agent::{AssistantSession, RagAssistant, RagAssistantConfig, TextChatQueue};
use murshid_config::AssistantConfig;
use murshid_core::{
    Conversation, Error, Result, RetrievedNode, Retriever, Role, Speaker, Utterance,
};
use murshid_llm::{TextGenerator, WatsonxChatModel};

struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct CapitalRetriever;

#[async_trait]
impl Retriever for CapitalRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedNode>> {
        Ok(vec![RetrievedNode::new("n1", "Riyadh is the capital.", 0.92)])
    }

    fn name(&self) -> &str {
        "capital"
    }
}

struct OfflineRetriever;

#[async_trait]
impl Retriever for OfflineRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedNode>> {
        Err(Error::Rag("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

async fn drain(utterance: Utterance) -> Result<String> {
    match utterance {
        Utterance::Text(text) => Ok(text),
        Utterance::Stream(mut stream) => {
            let mut text = String::new();
            while let Some(chunk) = stream.next().await {
                text.push_str(&chunk?.content());
            }
            Ok(text)
        }
    }
}

#[derive(Default)]
struct RecordingSpeaker {
    said: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn say(&self, utterance: Utterance, allow_interruptions: bool) -> Result<String> {
        let text = drain(utterance).await?;
        self.said.lock().push((text.clone(), allow_interruptions));
        Ok(text)
    }
}

/// Holds every utterance until the gate opens
struct GatedSpeaker {
    started: Notify,
    gate: Semaphore,
}

#[async_trait]
impl Speaker for GatedSpeaker {
    async fn say(&self, utterance: Utterance, _allow_interruptions: bool) -> Result<String> {
        let text = drain(utterance).await?;
        self.started.notify_one();
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::Speech(e.to_string()))?;
        Ok(text)
    }
}

fn assistant(generator: Arc<ScriptedGenerator>, system_prompt: &str) -> RagAssistant {
    RagAssistant::new(
        Arc::new(WatsonxChatModel::from_arc(generator)),
        system_prompt,
        RagAssistantConfig::default(),
    )
}

#[tokio::test]
async fn test_single_chunk_reply_for_plain_conversation() {
    let generator = ScriptedGenerator::new("Hi there");
    let assistant = assistant(generator.clone(), "S");
    let mut conv = Conversation::new("S").with_user_message("Hello");

    let chunks: Vec<_> = assistant
        .will_synthesize_reply(&mut conv)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    let chunk = chunks[0].as_ref().unwrap();
    assert_eq!(chunk.content(), "Hi there");
    assert_eq!(chunk.choices[0].delta.role, Role::Assistant);
    assert_eq!(
        generator.prompts.lock()[0],
        "<s> [INST]<<SYS>>\nS\n<</SYS>>\n\nHello [/INST] "
    );
}

#[tokio::test]
async fn test_retrieved_fragment_reaches_prompt() {
    let generator = ScriptedGenerator::new("Riyadh.");
    let assistant =
        assistant(generator.clone(), "You are Murshid.").with_retriever(Arc::new(CapitalRetriever));
    let mut conv = Conversation::new("You are Murshid.").with_user_message("What is the capital?");

    let _ = assistant
        .will_synthesize_reply(&mut conv)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    let prompt = generator.prompts.lock()[0].clone();
    let header = prompt
        .find("Context that might help answer the user's question:")
        .unwrap();
    let fragment = prompt.find("Riyadh is the capital.").unwrap();
    let separator = prompt.find("\n\n---\n\n").unwrap();
    let system = prompt.find("You are Murshid.").unwrap();
    assert!(header < fragment && fragment < separator && separator < system);
    assert!(prompt.ends_with("What is the capital? [/INST] "));
}

#[tokio::test]
async fn test_conversation_held_across_turns_keeps_one_context_block() {
    let generator = ScriptedGenerator::new("Riyadh.");
    let assistant =
        assistant(generator.clone(), "You are Murshid.").with_retriever(Arc::new(CapitalRetriever));
    let mut conv = Conversation::new("You are Murshid.").with_user_message("What is the capital?");

    for next in ["And the largest city?", "Thanks!"] {
        let _ = assistant
            .will_synthesize_reply(&mut conv)
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await;
        conv.push_assistant("Riyadh.");
        conv.push_user(next);
    }

    let prompts = generator.prompts.lock();
    assert_eq!(prompts.len(), 2);
    for prompt in prompts.iter() {
        assert_eq!(
            prompt
                .matches("Context that might help answer the user's question:")
                .count(),
            1
        );
        assert_eq!(prompt.matches("Riyadh is the capital.").count(), 1);
    }
    assert!(conv.system().content.ends_with("\n\n---\n\nYou are Murshid."));
}

#[tokio::test]
async fn test_session_records_turns_unaugmented() {
    let generator = ScriptedGenerator::new("Welcome to Riyadh.");
    let speaker = Arc::new(RecordingSpeaker::default());
    let assistant =
        assistant(generator.clone(), "You are Murshid.").with_retriever(Arc::new(CapitalRetriever));
    let session = AssistantSession::new(
        assistant,
        speaker.clone(),
        &AssistantConfig::default(),
    );

    session.greet().await.unwrap();
    let reply = session.handle_user_turn("What is the capital?").await.unwrap();
    assert_eq!(reply, "Welcome to Riyadh.");

    let history = session.history();
    let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(history.system().content, "You are Murshid.");

    let said = speaker.said.lock();
    assert_eq!(said[0].0, AssistantConfig::default().greeting);
    assert!(!said[0].1);
    assert_eq!(said[1].0, "Welcome to Riyadh.");
}

#[tokio::test]
async fn test_retrieval_failure_propagates_and_leaves_history() {
    let generator = ScriptedGenerator::new("unused");
    let config = RagAssistantConfig {
        fail_open: false,
        ..RagAssistantConfig::default()
    };
    let assistant = RagAssistant::new(
        Arc::new(WatsonxChatModel::from_arc(generator.clone())),
        "S",
        config,
    )
    .with_retriever(Arc::new(OfflineRetriever));
    let session = AssistantSession::new(
        assistant,
        Arc::new(RecordingSpeaker::default()),
        &AssistantConfig::default(),
    );

    let result = session.handle_user_turn("Hello").await;
    assert!(matches!(result, Err(Error::Rag(_))));
    assert_eq!(session.history().len(), 1);
    assert!(generator.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_retrieval_failure_fails_open_by_default() {
    let generator = ScriptedGenerator::new("Hello!");
    let session = AssistantSession::new(
        assistant(generator.clone(), "S").with_retriever(Arc::new(OfflineRetriever)),
        Arc::new(RecordingSpeaker::default()),
        &AssistantConfig::default(),
    );

    assert_eq!(session.handle_user_turn("Hello").await.unwrap(), "Hello!");
    assert!(generator.prompts.lock()[0].starts_with("<s> [INST]<<SYS>>\nS\n<</SYS>>"));
}

#[tokio::test]
async fn test_text_chat_queue_rejects_when_full() {
    let generator = ScriptedGenerator::new("ok");
    let speaker = Arc::new(GatedSpeaker {
        started: Notify::new(),
        gate: Semaphore::new(0),
    });
    let session = Arc::new(AssistantSession::new(
        assistant(generator, "S"),
        speaker.clone(),
        &AssistantConfig::default(),
    ));

    let (queue, worker) = TextChatQueue::spawn(session.clone(), 1);

    assert!(queue.submit("first").unwrap());
    tokio::time::timeout(Duration::from_secs(5), speaker.started.notified())
        .await
        .unwrap();

    assert!(queue.submit("second").unwrap());
    assert!(matches!(queue.submit("third"), Err(Error::QueueFull)));
    assert!(!queue.submit("   ").unwrap());

    speaker.gate.add_permits(8);
    drop(queue);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();

    let users: Vec<String> = session
        .history()
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(users, vec!["first".to_string(), "second".to_string()]);
}
