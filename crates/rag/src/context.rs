//! Context block rendering
//!
//! Retrieved fragments are placed ahead of the original system prompt:
//!
//! ```text
//! {header}
//!
//! {fragment 1}
//!
//! {fragment 2}{separator}{system prompt}
//! ```

use murshid_core::RetrievedNode;

/// Build the augmented system prompt.
///
/// Each fragment is rendered with [`RetrievedNode::content_for_llm`]. With no fragments
/// the header is immediately followed by the separator.
pub fn build_context_prompt(
    header: &str,
    nodes: &[RetrievedNode],
    separator: &str,
    system_prompt: &str,
) -> String {
    let mut prompt = String::from(header);
    for node in nodes {
        prompt.push_str("\n\n");
        prompt.push_str(&node.content_for_llm());
    }
    prompt.push_str(separator);
    prompt.push_str(system_prompt);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use murshid_config::constants::prompts::{CONTEXT_HEADER, CONTEXT_SEPARATOR};

    #[test]
    fn test_single_fragment_layout() {
        let nodes = vec![RetrievedNode::new("n1", "Riyadh is the capital.", 0.9)];
        let prompt =
            build_context_prompt(CONTEXT_HEADER, &nodes, CONTEXT_SEPARATOR, "You are Murshid.");

        assert_eq!(
            prompt,
            "Context that might help answer the user's question:\n\nRiyadh is the capital.\n\n---\n\nYou are Murshid."
        );

        let header_end = prompt.find(CONTEXT_HEADER).unwrap() + CONTEXT_HEADER.len();
        let fragment = prompt.find("Riyadh is the capital.").unwrap();
        let separator = prompt.find(CONTEXT_SEPARATOR).unwrap();
        assert!(header_end <= fragment && fragment < separator);
        assert!(prompt.ends_with("You are Murshid."));
    }

    #[test]
    fn test_multiple_fragments_in_order() {
        let nodes = vec![
            RetrievedNode::new("a", "First.", 0.9),
            RetrievedNode::new("b", "Second.", 0.8),
        ];
        let prompt = build_context_prompt("H", &nodes, "|", "S");
        assert_eq!(prompt, "H\n\nFirst.\n\nSecond.|S");
    }

    #[test]
    fn test_metadata_rendered_for_llm() {
        let mut node = RetrievedNode::new("a", "Body.", 0.9);
        node.metadata.insert("file_name".to_string(), "guide.pdf".to_string());
        node.metadata.insert("hash".to_string(), "abc".to_string());
        node.excluded_llm_metadata_keys.push("hash".to_string());
        let nodes = vec![node];
        let prompt = build_context_prompt("H", &nodes, "|", "S");
        assert_eq!(prompt, "H\n\nfile_name: guide.pdf\n\nBody.|S");
    }

    #[test]
    fn test_no_fragments() {
        let prompt = build_context_prompt("H", &[], "|", "S");
        assert_eq!(prompt, "H|S");
    }
}
