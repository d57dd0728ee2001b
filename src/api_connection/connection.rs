use std::env;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl Provider {
    pub fn gemini(
        api_key_env_var: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::Gemini {
            api_key_env_var: api_key_env_var.into(),
            base_url: base_url.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. } => model,
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::Gemini {
                api_key_env_var,
                base_url,
                client,
                ..
            } => {
                let api_key = env::var(api_key_env_var)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var.clone()))?;

                debug!(model = %request.model, url = %base_url, "sending chat completion");
                let response = client
                    .post(base_url.as_str())
                    .bearer_auth(api_key)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    Ok(serde_json::from_str::<ChatCompletionResponse>(&body)?)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "chat completion rejected");
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
