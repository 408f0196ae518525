//! Ollama Embeddings
//!
//! Uses Ollama's embedding API for generating dense vectors. Queries are
//! embedded as plain text; bge-m3 needs no instruction prefix.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use murshid_config::constants::{endpoints, rag};
use murshid_config::RagConfig;

use crate::embeddings::Embedder;
use crate::RagError;

/// Ollama embedding configuration
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingConfig {
    /// Ollama API endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Embedding dimension
    pub embedding_dim: usize,
}

impl Default for OllamaEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::OLLAMA_DEFAULT.to_string(),
            model: rag::EMBEDDING_MODEL.to_string(),
            embedding_dim: rag::EMBEDDING_DIM,
        }
    }
}

impl From<&RagConfig> for OllamaEmbeddingConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            endpoint: config.embedding_endpoint.clone(),
            model: config.embedding_model.clone(),
            embedding_dim: config.embedding_dim,
        }
    }
}

/// Request to Ollama embedding API
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from Ollama embedding API
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama embedder
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaEmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self) -> String {
        format!("{}/api/embed", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let response = self
            .client
            .post(self.url())
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama embedding failed: {} - {}",
                status, text
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        let embedding = embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))?;

        if embedding.len() != self.config.embedding_dim {
            tracing::warn!(
                model = %self.config.model,
                expected = self.config.embedding_dim,
                actual = embedding.len(),
                "Embedding dimension differs from configuration"
            );
        }

        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OllamaEmbeddingConfig::default();
        assert_eq!(config.model, "bge-m3");
        assert_eq!(config.embedding_dim, 1024);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = RagConfig {
            embedding_endpoint: "http://ollama:11434/".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            ..RagConfig::default()
        };

        let embedder = OllamaEmbedder::new(OllamaEmbeddingConfig::from(&settings));
        assert_eq!(embedder.url(), "http://ollama:11434/api/embed");
        assert_eq!(embedder.model(), "nomic-embed-text");
        assert_eq!(embedder.config.embedding_dim, 768);
    }

    #[test]
    fn test_request_body() {
        let json = serde_json::to_value(EmbedRequest {
            model: "bge-m3",
            input: "Where is Riyadh?",
        })
        .unwrap();
        assert_eq!(json["model"], "bge-m3");
        assert_eq!(json["input"], "Where is Riyadh?");
    }
}
