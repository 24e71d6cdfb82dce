//! Completion providers behind the generative fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use helpdesk_core::config::{LlmConfig, LlmProvider};

/// Answer of the secondary responder when no model is reachable.
pub const CANNED_RESPONSE: &str = "I'm not able to answer that right now. You can ask about an \
order (for example SH123), a support ticket, a product, or our store policies, or ask to speak \
to a human.";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str, system_instruction: &str)
        -> Result<String, ProviderError>;
}

/// Local responder that never fails. Used as the secondary strategy.
#[derive(Clone, Debug)]
pub struct CannedResponder {
    response: String,
}

impl CannedResponder {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::new(CANNED_RESPONSE)
    }
}

#[async_trait]
impl CompletionService for CannedResponder {
    async fn complete(
        &self,
        _prompt: &str,
        _system_instruction: &str,
    ) -> Result<String, ProviderError> {
        Ok(self.response.clone())
    }
}

/// OpenAI-compatible chat-completions client (OpenAI, Ollama's `/v1` API).
#[derive(Debug, Clone)]
pub struct HttpCompletionConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl HttpCompletionConfig {
    /// `None` when the configuration names no usable primary provider.
    pub fn from_llm_config(config: &LlmConfig) -> Option<Self> {
        let endpoint = config.completions_endpoint()?;
        if config.provider == LlmProvider::OpenAi && config.api_key.is_none() {
            return None;
        }
        Some(Self {
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: 0.2,
            timeout_secs: config.timeout_secs,
        })
    }
}

pub struct HttpCompletionClient {
    client: reqwest::Client,
    config: HttpCompletionConfig,
}

impl HttpCompletionClient {
    pub fn new(config: HttpCompletionConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            let value = format!("Bearer {}", key.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|e| ProviderError::Http(e.to_string()))?,
            );
        }

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system_instruction },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Response(format!("HTTP {status}: {text}")));
        }

        let text = response.text().await.map_err(|e| ProviderError::Http(e.to_string()))?;
        parse_completion(&text)
    }
}

fn parse_completion(text: &str) -> Result<String, ProviderError> {
    let parsed: ChatResponse =
        serde_json::from_str(text).map_err(|e| ProviderError::Serialization(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ProviderError::Response("completion carried no content".to_string()))
}
