//! Tool trait definition

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::ToolError;
use super::context::ToolContext;

/// A capability the planner and the conversational loop can invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name used in plans and ACTION lines
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the model
    fn description(&self) -> &'static str;

    /// JSON Schema for structured parameters
    fn schema(&self) -> Value;

    /// Execute with a free-text input
    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError>;

    /// Execute with structured parameters matching [`Tool::schema`]
    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Fetch a required string parameter
pub fn required_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArgument(format!("{} parameter is required and must be a string", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str() {
        let params = json!({"path": "a.txt", "count": 3});
        let params = params.as_object().unwrap();

        assert_eq!(required_str(params, "path").unwrap(), "a.txt");
        assert!(required_str(params, "count").is_err());
        let err = required_str(params, "missing").unwrap_err();
        assert!(err.to_string().contains("missing parameter is required"));
    }
}
