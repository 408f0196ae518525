//! watsonx.ai text generation backend
//!
//! The remote endpoint only supports single-shot generation: one POST, one
//! full continuation back. Failures never escape a turn; `generate` turns
//! them into text the assistant can speak instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use murshid_config::constants::{endpoints, generation};
use murshid_config::WatsonxConfig;

use crate::prompt::wrap_instruction;
use crate::token::IamTokenProvider;
use crate::LlmError;

/// Decoding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodingMethod {
    Greedy,
    Sample,
}

impl FromStr for DecodingMethod {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(DecodingMethod::Greedy),
            "sample" => Ok(DecodingMethod::Sample),
            other => Err(LlmError::Configuration(format!(
                "unknown decoding method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DecodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodingMethod::Greedy => write!(f, "greedy"),
            DecodingMethod::Sample => write!(f, "sample"),
        }
    }
}

/// Decoding parameters sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub decoding_method: DecodingMethod,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            decoding_method: DecodingMethod::Greedy,
            max_new_tokens: generation::MAX_NEW_TOKENS,
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
            repetition_penalty: generation::REPETITION_PENALTY,
        }
    }
}

/// Backend configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model_id: String,
    /// watsonx.ai project id
    pub project_id: String,
    /// IBM Cloud API key
    pub api_key: String,
    /// Regional base URL
    pub base_url: String,
    /// Generation API version
    pub api_version: String,
    /// IAM token endpoint
    pub token_url: String,
    /// Decoding parameters
    pub parameters: GenerationParameters,
    /// Bound on each HTTP call
    pub timeout: Duration,
    /// Refresh the bearer token near expiry
    pub token_refresh: bool,
    /// How early to refresh
    pub token_refresh_margin: Duration,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model_id", &self.model_id)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("token_url", &self.token_url)
            .field("parameters", &self.parameters)
            .field("timeout", &self.timeout)
            .field("token_refresh", &self.token_refresh)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_id: generation::MODEL_ID.to_string(),
            project_id: String::new(),
            api_key: String::new(),
            base_url: endpoints::WATSONX_DEFAULT.to_string(),
            api_version: endpoints::WATSONX_API_VERSION.to_string(),
            token_url: endpoints::IAM_TOKEN_URL.to_string(),
            parameters: GenerationParameters::default(),
            timeout: Duration::from_secs(generation::TIMEOUT_SECS),
            token_refresh: true,
            token_refresh_margin: Duration::from_secs(generation::TOKEN_REFRESH_MARGIN_SECS),
        }
    }
}

impl TryFrom<&WatsonxConfig> for LlmConfig {
    type Error = LlmError;

    fn try_from(config: &WatsonxConfig) -> Result<Self, Self::Error> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("watsonx API key is required".to_string()))?;
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("watsonx project id is required".to_string()))?;

        Ok(Self {
            model_id: config.model_id.clone(),
            project_id,
            api_key,
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            token_url: config.token_url.clone(),
            parameters: GenerationParameters {
                decoding_method: config.decoding_method.parse()?,
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                repetition_penalty: config.repetition_penalty,
            },
            timeout: config.timeout(),
            token_refresh: config.token_refresh,
            token_refresh_margin: config.token_refresh_margin(),
        })
    }
}

/// Single-shot text generation
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Generate a continuation for the prompt.
    ///
    /// Never fails: errors come back as an `Error: ...` string.
    async fn generate(&self, prompt: &str) -> String;

    /// Get model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    input: String,
    parameters: &'a GenerationParameters,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Option<Vec<GenerationOutput>>,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    generated_text: Option<String>,
}

/// watsonx.ai backend
pub struct WatsonxBackend {
    client: Client,
    config: LlmConfig,
    url: String,
    token: IamTokenProvider,
}

impl WatsonxBackend {
    /// Build the client and exchange the API key for a bearer token.
    ///
    /// A failed exchange is returned as [`LlmError::Auth`]; callers treat it
    /// as fatal.
    pub async fn connect(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let token = IamTokenProvider::new(
            client.clone(),
            config.token_url.clone(),
            config.api_key.clone(),
            config.token_refresh,
            config.token_refresh_margin,
        );
        token.initialize().await?;

        let url = format!(
            "{}{}?version={}",
            config.base_url.trim_end_matches('/'),
            endpoints::TEXT_GENERATION_PATH,
            config.api_version
        );

        tracing::info!(model = %config.model_id, url = %url, "watsonx backend ready");

        Ok(Self {
            client,
            config,
            url,
            token,
        })
    }

    /// Full generation URL including the version query
    pub fn generation_url(&self) -> &str {
        &self.url
    }

    /// Generate with typed errors.
    pub async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
        let bearer = self.token.bearer().await?;

        let request = GenerationRequest {
            input: wrap_instruction(prompt),
            parameters: &self.config.parameters,
            model_id: &self.config.model_id,
            project_id: &self.config.project_id,
        };

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(bearer)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(body
            .results
            .and_then(|results| results.into_iter().next())
            .and_then(|first| first.generated_text)
            .unwrap_or_else(|| generation::NO_TEXT_GENERATED.to_string()))
    }
}

#[async_trait]
impl TextGenerator for WatsonxBackend {
    async fn generate(&self, prompt: &str) -> String {
        let start = Instant::now();
        tracing::debug!(model = %self.config.model_id, "Generating response");

        let result = self.try_generate(prompt).await;
        metrics::histogram!("murshid_generation_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(text) => {
                metrics::counter!("murshid_generation_total", "outcome" => "ok").increment(1);
                tracing::debug!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    chars = text.len(),
                    "Generation complete"
                );
                text
            }
            Err(e) => {
                metrics::counter!("murshid_generation_total", "outcome" => "error").increment(1);
                tracing::error!(error = %e, "Generation failed, replying with error text");
                format!("Error: {}", e)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model_id
    }
}
