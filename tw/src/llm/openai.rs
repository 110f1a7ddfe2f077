//! OpenAI-compatible API client implementation
//!
//! Works against the OpenAI Chat Completions API and the many local servers
//! that mimic it (llama.cpp, vLLM, LM Studio).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::transport::{build_http, parse_json_reply, post_json};
use super::{LlmClient, LlmError};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    embedding_model: String,
    api_key: Option<String>,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "OpenAIClient::from_config: called");
        let api_key = config.api_key().map_err(|e| LlmError::Config(e.to_string()))?;
        let timeout = Duration::from_millis(config.timeout_ms);

        Ok(Self {
            model: config.model.clone(),
            embedding_model: config.embedding_model().to_string(),
            api_key,
            base_url: config.resolved_base_url(),
            http: build_http(timeout)?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }

    /// Build the request body for the chat completions endpoint
    fn build_request_body(&self, prompt: &str, schema: Option<&Value>) -> Value {
        debug!(%self.model, "build_request_body: called");

        // o-series and gpt-5 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = json!(self.max_tokens);
        } else {
            body["max_tokens"] = json!(self.max_tokens);
        }

        if let Some(schema) = schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "schema": schema,
                },
            });
        }

        body
    }

    async fn chat(&self, prompt: &str, schema: Option<&Value>) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(prompt, schema);
        let raw = post_json(&self.http, &url, self.api_key.as_deref(), &body, self.timeout).await?;
        let parsed: ChatResponse = serde_json::from_value(raw)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no content in completion".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(%self.model, prompt_len = prompt.len(), "OpenAIClient::complete: called");
        self.chat(prompt, None).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        debug!(model = %self.embedding_model, "OpenAIClient::embed: called");
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });
        let raw = post_json(&self.http, &url, self.api_key.as_deref(), &body, self.timeout).await?;
        let parsed: EmbeddingsResponse = serde_json::from_value(raw)?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::InvalidResponse("no embedding returned".to_string()))
    }

    async fn complete_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError> {
        debug!(%self.model, "OpenAIClient::complete_structured: called");
        let text = self.chat(prompt, Some(schema)).await?;
        parse_json_reply(&text)
    }
}
