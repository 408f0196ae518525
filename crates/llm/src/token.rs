//! IAM bearer token provider
//!
//! Exchanges a long-lived IBM Cloud API key for a short-lived bearer token.
//! The first exchange happens when the backend connects; a failure there is
//! fatal for the process. Later refreshes are best-effort and only affect
//! the turn that needed them.

use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::LlmError;

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Short-lived bearer credential
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// Token valid for `expires_in` from now; `None` means unknown lifetime
    pub fn new(value: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            expires_at: expires_in.map(|d| Instant::now() + d),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// True if the token expires within `margin`. Tokens of unknown lifetime never do.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()) <= margin)
            .unwrap_or(false)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Token provider backed by the IBM Cloud IAM identity service
pub struct IamTokenProvider {
    client: Client,
    token_url: String,
    api_key: String,
    refresh: bool,
    refresh_margin: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl IamTokenProvider {
    /// Create a provider. No network call is made until a token is needed.
    ///
    /// With `refresh` disabled the first token is reused for the whole
    /// session, even after it expires.
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        api_key: impl Into<String>,
        refresh: bool,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            api_key: api_key.into(),
            refresh,
            refresh_margin,
            cached: Mutex::new(None),
        }
    }

    /// Perform one API-key exchange.
    pub async fn acquire(&self) -> Result<AccessToken, LlmError> {
        let form = [("grant_type", GRANT_TYPE), ("apikey", self.api_key.as_str())];

        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| LlmError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Auth(format!(
                "identity service returned {}: {}",
                status, body
            )));
        }

        let token: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Auth(format!("malformed token response: {}", e)))?;

        tracing::info!(expires_in_secs = ?token.expires_in, "Obtained IAM access token");

        Ok(AccessToken::new(
            token.access_token,
            token.expires_in.map(Duration::from_secs),
        ))
    }

    /// Acquire and cache the first token.
    pub async fn initialize(&self) -> Result<(), LlmError> {
        let token = self.acquire().await?;
        *self.cached.lock().await = Some(token);
        Ok(())
    }

    /// Current bearer token, refreshed first if it is about to expire.
    pub async fn bearer(&self) -> Result<String, LlmError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !self.refresh || !token.expires_within(self.refresh_margin) {
                return Ok(token.value().to_string());
            }
            tracing::info!("IAM access token near expiry, refreshing");
        }

        let token = self.acquire().await?;
        let value = token.value().to_string();
        *cached = Some(token);
        Ok(value)
    }
}
