//! RAG (Retrieval-Augmented Generation) for the assistant
//!
//! Features:
//! - Query embedding through Ollama's embedding API
//! - Dense vector search via Qdrant
//! - Core Retriever trait implementation
//! - Rendering of retrieved fragments into a system-prompt context block

pub mod context;
pub mod embeddings;
pub mod ollama_embeddings;
pub mod retriever;
pub mod vector_store;

pub use context::build_context_prompt;
pub use embeddings::Embedder;
pub use ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
pub use retriever::VectorIndexRetriever;
pub use vector_store::{VectorSearch, VectorSearchResult, VectorStore, VectorStoreConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<RagError> for murshid_core::Error {
    fn from(err: RagError) -> Self {
        murshid_core::Error::Rag(err.to_string())
    }
}
