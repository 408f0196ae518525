//! Console speaker
//!
//! Writes utterances to a text sink as they stream in.

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::io::Write;

use murshid_core::{Error, Result, Speaker, Utterance};

const PREFIX: &str = "Murshid: ";

/// One line of console input
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// End the session
    Quit,
    /// Typed chat message, queued for the chat worker
    Chat(&'a str),
    /// Finished voice transcript
    Speak(&'a str),
}

/// Interpret a trimmed input line. Only an exact `/chat` or `/quit` command
/// word is recognized; anything else is spoken as is.
pub fn parse_command(line: &str) -> Command<'_> {
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match word {
        "/quit" if rest.trim().is_empty() => Command::Quit,
        "/chat" => Command::Chat(rest.trim()),
        _ => Command::Speak(line),
    }
}

pub struct ConsoleSpeaker<W> {
    out: Mutex<W>,
}

impl ConsoleSpeaker<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> ConsoleSpeaker<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write(&self, text: &str) -> Result<()> {
        let mut out = self.out.lock();
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| Error::Speech(e.to_string()))
    }
}

#[async_trait]
impl<W: Write + Send + 'static> Speaker for ConsoleSpeaker<W> {
    async fn say(&self, utterance: Utterance, allow_interruptions: bool) -> Result<String> {
        tracing::trace!(allow_interruptions, "Speaking");

        let mut spoken = String::new();
        self.write(PREFIX)?;

        match utterance {
            Utterance::Text(text) => {
                self.write(&text)?;
                spoken = text;
            }
            Utterance::Stream(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    let content = chunk?.content();
                    self.write(&content)?;
                    spoken.push_str(&content);
                }
            }
        }

        self.write("\n")?;
        Ok(spoken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murshid_core::ChatChunk;

    #[test]
    fn test_parse_command_words() {
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/chat  Where is Abha?"), Command::Chat("Where is Abha?"));
        assert_eq!(parse_command("/chat"), Command::Chat(""));
        assert_eq!(parse_command("Hello there"), Command::Speak("Hello there"));
    }

    #[test]
    fn test_parse_command_needs_exact_word() {
        assert_eq!(
            parse_command("/chatter about Jeddah"),
            Command::Speak("/chatter about Jeddah")
        );
        assert_eq!(parse_command("/chat2 hi"), Command::Speak("/chat2 hi"));
        assert_eq!(parse_command("/quitting now"), Command::Speak("/quitting now"));
    }

    #[tokio::test]
    async fn test_says_text() {
        let speaker = ConsoleSpeaker::new(Vec::new());
        let spoken = speaker.say(Utterance::text("Hello"), false).await.unwrap();

        assert_eq!(spoken, "Hello");
        assert_eq!(String::from_utf8(speaker.into_inner()).unwrap(), "Murshid: Hello\n");
    }

    #[tokio::test]
    async fn test_drains_stream() {
        let speaker = ConsoleSpeaker::new(Vec::new());
        let chunks: Vec<Result<ChatChunk>> = vec![
            Ok(ChatChunk::assistant("r", "Riyadh ")),
            Ok(ChatChunk::assistant("r", "is the capital.")),
        ];
        let stream = futures::stream::iter(chunks);

        let spoken = speaker
            .say(Utterance::Stream(Box::pin(stream)), true)
            .await
            .unwrap();

        assert_eq!(spoken, "Riyadh is the capital.");
        assert_eq!(
            String::from_utf8(speaker.into_inner()).unwrap(),
            "Murshid: Riyadh is the capital.\n"
        );
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let speaker = ConsoleSpeaker::new(Vec::new());
        let chunks: Vec<Result<ChatChunk>> = vec![Err(Error::Llm("boom".to_string()))];
        let stream = futures::stream::iter(chunks);

        let result = speaker.say(Utterance::Stream(Box::pin(stream)), false).await;
        assert!(matches!(result, Err(Error::Llm(_))));
    }
}
