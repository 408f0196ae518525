//! Typed chat queue
//!
//! Chat messages arrive from a synchronous event callback. They are handed
//! to a single worker through a bounded channel; when the channel is full
//! the message is rejected rather than waiting.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use murshid_core::{Error, Result};

use crate::session::AssistantSession;

/// Sender side of the text chat worker
#[derive(Clone)]
pub struct TextChatQueue {
    tx: mpsc::Sender<String>,
}

impl TextChatQueue {
    /// Start the worker. It exits once every queue handle is dropped and
    /// the backlog is drained.
    pub fn spawn(session: Arc<AssistantSession>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                match session.handle_chat_message(&text).await {
                    Ok(reply) => tracing::debug!(chars = reply.len(), "Chat message answered"),
                    Err(e) => tracing::error!(error = %e, "Chat message failed"),
                }
            }
            tracing::debug!("Text chat worker stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue a message without waiting.
    ///
    /// Returns `Ok(false)` for blank messages, which are dropped.
    pub fn submit(&self, text: impl Into<String>) -> Result<bool> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(false);
        }

        match self.tx.try_send(text) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                metrics::counter!("murshid_text_chat_rejected_total").increment(1);
                tracing::warn!("Text chat queue full, message rejected");
                Err(Error::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(Error::ChannelClosed),
        }
    }
}
