//! Completion backend module
//!
//! Provides the [`LlmClient`] contract, its Ollama and OpenAI-compatible
//! implementations, and reply post-processing.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod ollama;
mod openai;
mod think;
mod transport;

pub use client::LlmClient;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use think::strip_think_blocks;

use crate::config::LlmConfig;

/// Create a completion backend based on the provider specified in config
///
/// Supports "ollama" and "openai" (any OpenAI-compatible server).
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "ollama" => {
            debug!("create_client: creating Ollama client");
            Ok(Arc::new(OllamaClient::from_config(config)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: ollama, openai",
                other
            )))
        }
    }
}
