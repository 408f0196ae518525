//! Language Model traits

use crate::{ChatStream, Conversation};

/// Streaming chat interface expected by the voice session
///
/// Implementations:
/// - `WatsonxChatModel` - single-shot watsonx.ai generation exposed as a
///   one-chunk stream
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(WatsonxChatModel::new(backend));
/// let conversation = Conversation::new("You are a travel guide").with_user_message("Hello");
/// let mut stream = llm.chat(&conversation);
/// while let Some(chunk) = stream.next().await {
///     print!("{}", chunk?.content());
/// }
/// ```
pub trait LanguageModel: Send + Sync + 'static {
    /// Start a reply for the conversation.
    ///
    /// The returned stream is lazy: no network work happens until it is
    /// polled, and dropping it abandons the request.
    fn chat(&self, conversation: &Conversation) -> ChatStream;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatChunk;
    use futures::StreamExt;

    struct EchoLlm;

    impl LanguageModel for EchoLlm {
        fn chat(&self, conversation: &Conversation) -> ChatStream {
            let reply = conversation
                .last_user()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Box::pin(futures::stream::once(async move {
                Ok(ChatChunk::assistant("echo", reply))
            }))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_trait_object_stream() {
        let llm: Box<dyn LanguageModel> = Box::new(EchoLlm);
        let conv = Conversation::new("S").with_user_message("ping");

        let chunks: Vec<_> = llm.chat(&conv).collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap().content(), "ping");
        assert_eq!(llm.model_name(), "echo");
    }
}
