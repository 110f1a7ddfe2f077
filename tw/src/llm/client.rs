//! LlmClient trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::LlmError;

/// Stateless completion backend - each call is independent
///
/// Latency and retry policy belong to the implementation. Callers that need
/// cancellation race the returned future against their token.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a text completion for a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Generate an embedding vector for the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Generate a completion constrained to a JSON schema
    ///
    /// The returned value has been parsed as JSON; it is not validated
    /// against the schema.
    async fn complete_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError>;
}
