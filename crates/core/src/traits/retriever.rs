//! Retrieval traits for RAG

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Result;

/// Retriever interface for RAG
///
/// Implementations:
/// - `VectorIndexRetriever` - embedding + Qdrant similarity search
///
/// # Example
///
/// ```ignore
/// let retriever: Arc<dyn Retriever> = Arc::new(VectorIndexRetriever::new(embedder, store));
/// let nodes = retriever.retrieve("What is the capital?", 1).await?;
/// for node in nodes {
///     println!("{}: {}", node.score, node.content);
/// }
/// ```
#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    /// Retrieve the `top_k` best-matching fragments, highest score first.
    ///
    /// No timeout is applied here; any bound comes from the index client.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedNode>>;

    /// Get retriever name for logging
    fn name(&self) -> &str;
}

/// A retrieved document fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedNode {
    /// Document ID
    pub id: String,
    /// Fragment text
    pub content: String,
    /// Relevance score
    pub score: f32,
    /// Document metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Metadata keys hidden from the language model
    #[serde(default)]
    pub excluded_llm_metadata_keys: Vec<String>,
}

impl RetrievedNode {
    /// Create a new node
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
            metadata: BTreeMap::new(),
            excluded_llm_metadata_keys: Vec::new(),
        }
    }

    /// Render the fragment as the language model sees it.
    ///
    /// Metadata not listed in `excluded_llm_metadata_keys` is rendered as
    /// `key: value` lines followed by a blank line and the text. Without
    /// visible metadata only the text is returned.
    pub fn content_for_llm(&self) -> String {
        let metadata: Vec<String> = self
            .metadata
            .iter()
            .filter(|(k, _)| !self.excluded_llm_metadata_keys.contains(k))
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();

        if metadata.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n\n{}", metadata.join("\n"), self.content)
        }
    }
}
