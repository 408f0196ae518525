//! Process wiring

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use murshid_agent::{AssistantSession, RagAssistant, RagAssistantConfig};
use murshid_config::{ObservabilityConfig, Settings};
use murshid_core::Speaker;
use murshid_llm::{LlmConfig, WatsonxBackend, WatsonxChatModel};
use murshid_rag::{
    OllamaEmbedder, OllamaEmbeddingConfig, VectorIndexRetriever, VectorStore, VectorStoreConfig,
};

use crate::StartupError;

const LOG_TARGETS: &[&str] = &[
    "murshid",
    "murshid_server",
    "murshid_agent",
    "murshid_llm",
    "murshid_rag",
    "murshid_config",
];

/// Initialize tracing. `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &ObservabilityConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log_level;
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
            .into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    // stdout belongs to the console session
    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Install the Prometheus exporter when enabled. Must run inside the runtime.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<(), StartupError> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

pub fn read_system_prompt(path: impl AsRef<Path>) -> Result<String, StartupError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| StartupError::SystemPrompt {
        path: path.display().to_string(),
        source,
    })
}

/// Connect the language model and, if enabled, the knowledge index.
pub async fn build_assistant(
    settings: &Settings,
    system_prompt: String,
) -> Result<RagAssistant, StartupError> {
    let llm_config = LlmConfig::try_from(&settings.watsonx)?;
    let backend = WatsonxBackend::connect(llm_config).await?;
    let llm = Arc::new(WatsonxChatModel::new(backend));

    let assistant = RagAssistant::new(llm, system_prompt, RagAssistantConfig::from(settings));

    if !settings.rag.enabled {
        tracing::info!("Retrieval disabled, using the plain system prompt");
        return Ok(assistant);
    }

    match connect_retriever(settings).await {
        Ok(retriever) => {
            tracing::info!(
                endpoint = %settings.rag.qdrant_endpoint,
                collection = %settings.rag.qdrant_collection,
                model = %settings.rag.embedding_model,
                "Retrieval ready"
            );
            Ok(assistant.with_retriever(Arc::new(retriever)))
        }
        Err(e) if settings.rag.fail_open => {
            tracing::warn!(error = %e, "Knowledge index unavailable, retrieval disabled");
            Ok(assistant)
        }
        Err(e) => Err(e.into()),
    }
}

async fn connect_retriever(
    settings: &Settings,
) -> Result<VectorIndexRetriever, murshid_rag::RagError> {
    let store = VectorStore::new(VectorStoreConfig::from(&settings.rag)).await?;
    store.ensure_collection().await?;
    let embedder = OllamaEmbedder::new(OllamaEmbeddingConfig::from(&settings.rag));
    Ok(VectorIndexRetriever::new(Arc::new(embedder), Arc::new(store)))
}

/// Everything needed for one user's session.
pub async fn build_session(
    settings: &Settings,
    speaker: Arc<dyn Speaker>,
) -> Result<AssistantSession, StartupError> {
    let system_prompt = read_system_prompt(&settings.assistant.system_prompt_path)?;
    tracing::info!(
        path = %settings.assistant.system_prompt_path,
        chars = system_prompt.len(),
        "Loaded system prompt"
    );

    let assistant = build_assistant(settings, system_prompt).await?;
    Ok(AssistantSession::new(assistant, speaker, &settings.assistant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_system_prompt() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "You are Murshid, a guide to Saudi Arabia.").unwrap();

        let prompt = read_system_prompt(file.path()).unwrap();
        assert_eq!(prompt, "You are Murshid, a guide to Saudi Arabia.");
    }

    #[test]
    fn test_missing_system_prompt() {
        let err = read_system_prompt("/nonexistent/system_prompt.txt").unwrap_err();
        assert!(matches!(err, StartupError::SystemPrompt { .. }));
        assert!(err.to_string().contains("/nonexistent/system_prompt.txt"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let mut settings = Settings::default();
        settings.watsonx.api_key = None;
        settings.watsonx.token_url = "http://127.0.0.1:1/identity/token".to_string();

        let result = build_assistant(&settings, "S".to_string()).await;
        assert!(matches!(
            result,
            Err(StartupError::Llm(murshid_llm::LlmError::Configuration(_)))
        ));
    }

    #[test]
    fn test_metrics_disabled_is_noop() {
        assert!(init_metrics(&ObservabilityConfig::default()).is_ok());
    }
}
