//! Text Embeddings
//!
//! Query text to dense vector. The same model that built the index must
//! embed queries, so the model is fixed by configuration.

use async_trait::async_trait;

use crate::RagError;

/// Dense text embedder
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Get model name
    fn model(&self) -> &str;
}
