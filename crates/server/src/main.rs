//! Murshid entry point
//!
//! Reads one line per turn from stdin. A plain line is handled as a finished
//! voice transcript; `/chat <message>` goes through the typed chat queue;
//! `/quit` ends the session.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use murshid_agent::TextChatQueue;
use murshid_config::load_settings;
use murshid_server::{
    build_session, init_metrics, init_tracing, parse_command, Command, ConsoleSpeaker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("MURSHID_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&settings.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = env.as_deref().unwrap_or("default"),
        "Starting Murshid"
    );

    if let Err(e) = init_metrics(&settings.observability) {
        tracing::error!(error = %e, "Failed to start metrics exporter");
        std::process::exit(1);
    }

    let session = match build_session(&settings, Arc::new(ConsoleSpeaker::stdout())).await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    session.greet().await?;

    let (chat, chat_worker) =
        TextChatQueue::spawn(session.clone(), settings.assistant.chat_queue_capacity);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match parse_command(line) {
            Command::Quit => break,
            Command::Chat(message) => {
                if let Err(e) = chat.submit(message) {
                    tracing::warn!(error = %e, "Chat message not queued");
                }
            }
            Command::Speak(transcript) => {
                if let Err(e) = session.handle_user_turn(transcript).await {
                    tracing::error!(error = %e, "Turn failed");
                }
            }
        }
    }

    drop(chat);
    chat_worker.await?;
    tracing::info!("Session ended");
    Ok(())
}
