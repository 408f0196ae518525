//! Vector index retriever
//!
//! Embeds the query with the index's embedding model and returns the
//! nearest fragments from the vector store.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use murshid_core::{RetrievedNode, Retriever};

use crate::embeddings::Embedder;
use crate::vector_store::{VectorSearch, VectorSearchResult};

/// Dense retriever over a prebuilt knowledge index
pub struct VectorIndexRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorSearch>,
}

impl VectorIndexRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorSearch>) -> Self {
        Self { embedder, store }
    }
}

impl From<VectorSearchResult> for RetrievedNode {
    fn from(result: VectorSearchResult) -> Self {
        RetrievedNode {
            id: result.id,
            content: result.content,
            score: result.score,
            metadata: result.metadata,
            excluded_llm_metadata_keys: result.excluded_llm_metadata_keys,
        }
    }
}

#[async_trait]
impl Retriever for VectorIndexRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> murshid_core::Result<Vec<RetrievedNode>> {
        let start = Instant::now();

        let embedding = self.embedder.embed(query).await?;
        let mut results = self.store.search(&embedding, top_k).await?;

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        tracing::debug!(
            model = %self.embedder.model(),
            top_k,
            hits = results.len(),
            best_score = results.first().map(|r| r.score),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Vector retrieval complete"
        );

        Ok(results.into_iter().map(RetrievedNode::from).collect())
    }

    fn name(&self) -> &str {
        "vector_index"
    }
}
