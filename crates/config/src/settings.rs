//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::constants::{endpoints, generation, prompts, rag, session};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Remote generation endpoint and decoding parameters
    #[serde(default)]
    pub watsonx: WatsonxConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Assistant behavior (prompts, greeting, text chat)
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// watsonx.ai connection and decoding parameters
#[derive(Clone, Serialize, Deserialize)]
pub struct WatsonxConfig {
    /// Model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// IBM Cloud API key, exchanged for a bearer token at startup.
    /// Falls back to `IBM_WATSONX_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// watsonx.ai project id. Falls back to `IBM_WATSONX_PROJECT_ID` when unset.
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// IAM token exchange endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// `greedy` or `sample`
    #[serde(default = "default_decoding_method")]
    pub decoding_method: String,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    /// Bound on a whole HTTP call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Re-acquire the bearer token when it nears expiry
    #[serde(default = "default_true")]
    pub token_refresh: bool,

    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,
}

fn default_model_id() -> String {
    generation::MODEL_ID.to_string()
}

fn default_base_url() -> String {
    endpoints::WATSONX_DEFAULT.to_string()
}

fn default_token_url() -> String {
    endpoints::IAM_TOKEN_URL.to_string()
}

fn default_api_version() -> String {
    endpoints::WATSONX_API_VERSION.to_string()
}

fn default_decoding_method() -> String {
    generation::DECODING_METHOD.to_string()
}

fn default_max_new_tokens() -> u32 {
    generation::MAX_NEW_TOKENS
}

fn default_temperature() -> f32 {
    generation::TEMPERATURE
}

fn default_top_p() -> f32 {
    generation::TOP_P
}

fn default_repetition_penalty() -> f32 {
    generation::REPETITION_PENALTY
}

fn default_timeout_secs() -> u64 {
    generation::TIMEOUT_SECS
}

fn default_token_refresh_margin_secs() -> u64 {
    generation::TOKEN_REFRESH_MARGIN_SECS
}

fn default_true() -> bool {
    true
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            api_key: None,
            project_id: None,
            base_url: default_base_url(),
            token_url: default_token_url(),
            api_version: default_api_version(),
            decoding_method: default_decoding_method(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            timeout_secs: default_timeout_secs(),
            token_refresh: true,
            token_refresh_margin_secs: default_token_refresh_margin_secs(),
        }
    }
}

impl fmt::Debug for WatsonxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonxConfig")
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("api_version", &self.api_version)
            .field("decoding_method", &self.decoding_method)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("repetition_penalty", &self.repetition_penalty)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_refresh", &self.token_refresh)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .finish()
    }
}

impl WatsonxConfig {
    /// Fill unset or blank credentials from `IBM_WATSONX_*` variables.
    fn fill_credentials(&mut self, vars: &HashMap<String, String>) {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        if blank(&self.api_key) {
            self.api_key = vars.get("IBM_WATSONX_API_KEY").cloned();
        }
        if blank(&self.project_id) {
            self.project_id = vars.get("IBM_WATSONX_PROJECT_ID").cloned();
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin_secs)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Enable RAG retrieval
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Qdrant endpoint URL
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,

    /// Qdrant collection holding the pre-built index
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,

    /// Qdrant API key (optional, for cloud deployments)
    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    /// Embedding service endpoint (Ollama)
    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,

    /// Embedding model; must match the one used to build the index
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Fragments retrieved per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Answer without context when retrieval fails instead of failing the turn
    #[serde(default = "default_true")]
    pub fail_open: bool,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_qdrant_collection() -> String {
    rag::COLLECTION.to_string()
}

fn default_embedding_endpoint() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}

fn default_embedding_model() -> String {
    rag::EMBEDDING_MODEL.to_string()
}

fn default_embedding_dim() -> usize {
    rag::EMBEDDING_DIM
}

fn default_top_k() -> usize {
    rag::TOP_K
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_collection: default_qdrant_collection(),
            qdrant_api_key: None,
            embedding_endpoint: default_embedding_endpoint(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            top_k: default_top_k(),
            fail_open: true,
        }
    }
}

/// Assistant behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// File holding the system prompt
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: String,

    /// Spoken once when the session starts
    #[serde(default = "default_greeting")]
    pub greeting: String,

    #[serde(default = "default_context_header")]
    pub context_header: String,

    #[serde(default = "default_context_separator")]
    pub context_separator: String,

    /// Whether the user may barge in on replies
    #[serde(default)]
    pub allow_interruptions: bool,

    /// Pending typed chat messages before new ones are rejected
    #[serde(default = "default_chat_queue_capacity")]
    pub chat_queue_capacity: usize,
}

fn default_system_prompt_path() -> String {
    prompts::SYSTEM_PROMPT_PATH.to_string()
}

fn default_greeting() -> String {
    prompts::GREETING.to_string()
}

fn default_context_header() -> String {
    prompts::CONTEXT_HEADER.to_string()
}

fn default_context_separator() -> String {
    prompts::CONTEXT_SEPARATOR.to_string()
}

fn default_chat_queue_capacity() -> usize {
    session::CHAT_QUEUE_CAPACITY
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: default_system_prompt_path(),
            greeting: default_greeting(),
            context_header: default_context_header(),
            context_separator: default_context_separator(),
            allow_interruptions: false,
            chat_queue_capacity: default_chat_queue_capacity(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Settings {
    /// Validate settings
    ///
    /// Missing credentials are reported here so the process can stop before
    /// serving any turn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_watsonx()?;
        self.validate_rag()?;
        self.validate_assistant()?;
        Ok(())
    }

    fn validate_watsonx(&self) -> Result<(), ConfigError> {
        let wx = &self.watsonx;

        if wx.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingField(
                "watsonx.api_key (or IBM_WATSONX_API_KEY)".to_string(),
            ));
        }

        if wx.project_id.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigError::MissingField(
                "watsonx.project_id (or IBM_WATSONX_PROJECT_ID)".to_string(),
            ));
        }

        if !matches!(wx.decoding_method.as_str(), "greedy" | "sample") {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.decoding_method".to_string(),
                message: format!("Must be 'greedy' or 'sample', got '{}'", wx.decoding_method),
            });
        }

        if wx.max_new_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.max_new_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&wx.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", wx.temperature),
            });
        }

        if !(wx.top_p > 0.0 && wx.top_p <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.top_p".to_string(),
                message: format!("Must be in (0.0, 1.0], got {}", wx.top_p),
            });
        }

        if !(1.0..=2.0).contains(&wx.repetition_penalty) {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.repetition_penalty".to_string(),
                message: format!("Must be between 1.0 and 2.0, got {}", wx.repetition_penalty),
            });
        }

        if wx.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watsonx.timeout_secs".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.rag.enabled && self.rag.qdrant_collection.is_empty() {
            return Err(ConfigError::MissingField("rag.qdrant_collection".to_string()));
        }

        Ok(())
    }

    fn validate_assistant(&self) -> Result<(), ConfigError> {
        if self.assistant.chat_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "assistant.chat_queue_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from `config/` and the environment
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    load_settings_with_vars(dir, env, &vars)
}

/// Load settings with an explicit set of environment variables in place of
/// the process environment.
pub fn load_settings_with_vars(
    dir: &Path,
    env: Option<&str>,
    vars: &HashMap<String, String>,
) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::from(dir.join("default")).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("MURSHID")
            .separator("__")
            .try_parsing(true)
            .source(Some(vars.clone())),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;
    settings.watsonx.fill_credentials(vars);

    settings.validate()?;

    tracing::debug!(
        model = %settings.watsonx.model_id,
        base_url = %settings.watsonx.base_url,
        rag_enabled = settings.rag.enabled,
        "Settings loaded"
    );

    Ok(settings)
}
