//! Hugging Face inference client.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{instrument, warn};

use crate::config::GenerationConfig;

use super::ContentGenerator;
use super::error::GenerationError;
use super::types::{InferenceParameters, InferenceRequest, InferenceResponse};

/// Client for the text-generation inference API.
///
/// Cheap to clone. Without an API key every request resolves to
/// [`GenerationError::NotConfigured`] without touching the network.
#[derive(Clone)]
pub struct HfClient {
    inner: Arc<HfClientInner>,
}

struct HfClientInner {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
    max_new_tokens: u32,
}

impl std::fmt::Debug for HfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfClient")
            .field("api_url", &self.inner.api_url)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

impl HfClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(HfClientInner {
                client,
                api_url: config.api_url.clone(),
                api_key: config.api_key.clone(),
                max_new_tokens: config.max_new_tokens,
            }),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    /// Request a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is configured, the request fails or times
    /// out, or the API answers with an error.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(GenerationError::NotConfigured)?;

        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: self.inner.max_new_tokens,
                return_full_text: false,
            },
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(GenerationError::RateLimited(retry_after));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GenerationError::Unauthorized("Invalid API key".to_string()));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        let parsed = serde_json::from_str::<InferenceResponse>(&body);

        match parsed {
            Ok(parsed) => match parsed.into_text() {
                Ok(text) if status.is_success() => Ok(text.trim().to_string()),
                Ok(_) => Err(GenerationError::Api {
                    status: status.as_u16(),
                    message: body,
                }),
                Err(message) => Err(GenerationError::Api {
                    status: status.as_u16(),
                    message,
                }),
            },
            Err(_) if status.is_success() => Ok(body),
            Err(_) => Err(GenerationError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Http(e)
    }
}

#[async_trait]
impl ContentGenerator for HfClient {
    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(GenerationError::NotConfigured) => GenerationError::NotConfigured.user_message(),
            Err(e) => {
                warn!(error = %e, "Content generation failed");
                e.user_message()
            }
        }
    }
}
