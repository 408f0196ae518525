//! Vector Store using Qdrant
//!
//! Similarity search over an already-built knowledge collection. Each point
//! carries its fragment text under the `text` payload key; other scalar
//! payload entries become metadata. An optional `excluded_llm_metadata_keys`
//! list names metadata the language model should not see.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{value::Kind, SearchPointsBuilder, Value},
    Qdrant,
};
use std::collections::{BTreeMap, HashMap};

use murshid_config::constants::{endpoints, rag};
use murshid_config::RagConfig;

use crate::RagError;

const TEXT_KEY: &str = "text";
const EXCLUDED_LLM_KEYS: &str = "excluded_llm_metadata_keys";

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: rag::COLLECTION.to_string(),
            api_key: None,
        }
    }
}

impl From<&RagConfig> for VectorStoreConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            endpoint: config.qdrant_endpoint.clone(),
            collection: config.qdrant_collection.clone(),
            api_key: config.qdrant_api_key.clone(),
        }
    }
}

/// Search result from vector store
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchResult {
    /// Point ID
    pub id: String,
    /// Similarity score
    pub score: f32,
    /// Fragment text
    pub content: String,
    /// Metadata
    pub metadata: BTreeMap<String, String>,
    /// Metadata keys hidden from the language model
    pub excluded_llm_metadata_keys: Vec<String>,
}

/// Nearest-neighbour search over embedded fragments
#[async_trait]
pub trait VectorSearch: Send + Sync + 'static {
    /// Best `top_k` matches, highest score first
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>, RagError>;
}

/// Vector store client
pub struct VectorStore {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl VectorStore {
    /// Create a new vector store connection
    pub async fn new(config: VectorStoreConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Fail unless the configured collection exists.
    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if !exists {
            return Err(RagError::VectorStore(format!(
                "collection '{}' not found",
                self.config.collection
            )));
        }

        tracing::info!(collection = %self.config.collection, "Knowledge collection ready");
        Ok(())
    }
}

#[async_trait]
impl VectorSearch for VectorStore {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>, RagError> {
        let search_builder = SearchPointsBuilder::new(
            &self.config.collection,
            query_embedding.to_vec(),
            top_k as u64,
        )
        .with_payload(true);

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let search_results = results
            .result
            .into_iter()
            .map(|point| {
                let payload = split_payload(point.payload);

                let id = point
                    .id
                    .map(|pid| match pid.point_id_options {
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => {
                            n.to_string()
                        }
                        None => String::new(),
                    })
                    .unwrap_or_default();

                VectorSearchResult {
                    id,
                    score: point.score,
                    content: payload.content,
                    metadata: payload.metadata,
                    excluded_llm_metadata_keys: payload.excluded_llm_metadata_keys,
                }
            })
            .collect();

        Ok(search_results)
    }
}

#[derive(Debug, Default)]
struct PointPayload {
    content: String,
    metadata: BTreeMap<String, String>,
    excluded_llm_metadata_keys: Vec<String>,
}

/// Separate fragment text from metadata.
///
/// Keys starting with `_` are index bookkeeping and are dropped, as are
/// non-scalar values.
fn split_payload(payload: HashMap<String, Value>) -> PointPayload {
    let mut split = PointPayload::default();

    for (key, value) in payload {
        if key == EXCLUDED_LLM_KEYS {
            if let Some(Kind::ListValue(list)) = value.kind {
                split.excluded_llm_metadata_keys =
                    list.values.into_iter().filter_map(scalar_to_string).collect();
            }
            continue;
        }

        let Some(text) = scalar_to_string(value) else {
            continue;
        };
        if key == TEXT_KEY {
            split.content = text;
        } else if !key.starts_with('_') {
            split.metadata.insert(key, text);
        }
    }

    split
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value.kind? {
        Kind::StringValue(s) => Some(s),
        Kind::IntegerValue(i) => Some(i.to_string()),
        Kind::DoubleValue(d) => Some(d.to_string()),
        Kind::BoolValue(b) => Some(b.to_string()),
        _ => None,
    }
}
