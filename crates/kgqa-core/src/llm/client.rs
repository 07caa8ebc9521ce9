//! Ollama chat client
//!
//! Sends a single system prompt to `POST {base_url}/api/chat` with streaming
//! disabled and returns the reply text. Retries live in
//! [`crate::enrich::RetryPolicy`], not here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::Generator;
use super::types::{ChatRequest, ChatResponse, LlmResponse, Message};

/// Ollama LLM client
#[derive(Clone)]
pub struct OllamaClient {
    http_client: HttpClient,
    config: LlmConfig,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("temperature", &self.config.temperature)
            .finish()
    }
}

/// Builder for creating an OllamaClient
#[derive(Default)]
pub struct OllamaClientBuilder {
    config: Option<LlmConfig>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl OllamaClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the base URL from the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the model from the configuration
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<OllamaClient> {
        let mut config = self.config.unwrap_or_default();
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        if config.model.is_empty() {
            return Err(Error::ConfigError("llm.model must not be empty".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        Ok(OllamaClient {
            http_client,
            config,
        })
    }
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        OllamaClientBuilder::new().config(config).build()
    }

    pub fn builder() -> OllamaClientBuilder {
        OllamaClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    /// Send a conversation and return the reply
    pub async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse> {
        let request = ChatRequest::new(&self.config.model, messages)
            .with_temperature(self.config.temperature);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat request"
        );

        let response = self
            .http_client
            .post(self.chat_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::LLMError(format!("Failed to parse response: {}", e)))?;

        let llm = LlmResponse::from_chat_response(chat_response)
            .ok_or_else(|| Error::LLMError("Empty response from API".to_string()))?;

        debug!(
            model = %llm.model,
            input_tokens = llm.input_tokens,
            output_tokens = llm.output_tokens,
            "Chat request completed"
        );
        Ok(llm)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::LLMTimeout(self.config.timeout_secs)
        } else {
            Error::NetworkError(error)
        }
    }

    async fn handle_error_response(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> Error {
        let body = response.text().await.unwrap_or_default();
        error_for_status(status.as_u16(), &body, &self.config.model)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.complete(vec![Message::system(prompt)]).await?;
        Ok(response.content)
    }
}

fn error_for_status(status: u16, body: &str, model: &str) -> Error {
    match status {
        429 => Error::RateLimited(extract_retry_after(body).unwrap_or(5)),
        400 => Error::LLMError(format!("Bad request: {}", body)),
        404 => Error::LLMError(format!(
            "Model '{}' not found. Run `ollama pull {}`: {}",
            model, model, body
        )),
        500..=599 => Error::LLMServerError {
            status,
            message: body.to_string(),
        },
        _ => Error::LLMError(format!("HTTP error {}: {}", status, body)),
    }
}

/// Extract a retry-after hint from an error body
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    if let Some(retry_after) = json.get("retry_after").and_then(|v| v.as_u64()) {
        return Some(retry_after);
    }
    json.get("error")?.get("retry_after")?.as_u64()
}
