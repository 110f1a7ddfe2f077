//! Ollama API client implementation
//!
//! Uses the native `/api/generate` and `/api/embeddings` endpoints with
//! streaming disabled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::transport::{build_http, parse_json_reply, post_json};
use super::{LlmClient, LlmError};
use crate::config::LlmConfig;

/// Ollama API client
pub struct OllamaClient {
    model: String,
    embedding_model: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "OllamaClient::from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            model: config.model.clone(),
            embedding_model: config.embedding_model().to_string(),
            base_url: config.resolved_base_url(),
            http: build_http(timeout)?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }

    /// Build the request body for `/api/generate`
    fn build_generate_body(&self, prompt: &str, format: Option<&Value>) -> Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        });
        if let Some(schema) = format {
            body["format"] = schema.clone();
        }
        body
    }

    async fn generate(&self, prompt: &str, format: Option<&Value>) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.build_generate_body(prompt, format);
        let raw = post_json(&self.http, &url, None, &body, self.timeout).await?;
        let parsed: GenerateResponse = serde_json::from_value(raw)?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(%self.model, prompt_len = prompt.len(), "OllamaClient::complete: called");
        self.generate(prompt, None).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        debug!(model = %self.embedding_model, "OllamaClient::embed: called");
        let url = format!("{}/api/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "prompt": text,
        });
        let raw = post_json(&self.http, &url, None, &body, self.timeout).await?;
        let parsed: EmbeddingResponse = serde_json::from_value(raw)?;
        if parsed.embedding.is_empty() {
            return Err(LlmError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(parsed.embedding)
    }

    async fn complete_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError> {
        debug!(%self.model, "OllamaClient::complete_structured: called");
        let text = self.generate(prompt, Some(schema)).await?;
        parse_json_reply(&text)
    }
}
