//! Prompt formatting
//!
//! Linearizes a conversation into the single string an instruction-tuned
//! Llama-style model expects. The delimiters must match byte for byte.

use murshid_core::{Conversation, Message, Role};

/// Flatten a conversation into one prompt string.
///
/// - system: `<s> [INST]<<SYS>>\n{content}\n<</SYS>>\n\n`
/// - assistant: `{content} </s><s> [INST] ` (closes the turn, opens the next)
/// - user: `{content} [/INST] `
pub fn format_prompt(conversation: &Conversation) -> String {
    conversation
        .messages()
        .iter()
        .fold(String::new(), |mut prompt, message| {
            push_message(&mut prompt, message);
            prompt
        })
}

fn push_message(prompt: &mut String, message: &Message) {
    let content = &message.content;
    match message.role {
        Role::System => {
            prompt.push_str("<s> [INST]<<SYS>>\n");
            prompt.push_str(content);
            prompt.push_str("\n<</SYS>>\n\n");
        }
        Role::Assistant => {
            prompt.push_str(content);
            prompt.push_str(" </s><s> [INST] ");
        }
        Role::User => {
            prompt.push_str(content);
            prompt.push_str(" [/INST] ");
        }
    }
}

/// Wrap a formatted prompt in the generation endpoint's instruction delimiters.
pub fn wrap_instruction(prompt: &str) -> String {
    format!("<s> [INST] {} [/INST]", prompt)
}
