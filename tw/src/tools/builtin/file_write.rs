//! file_write tool - write content to a file

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, required_str};

/// Write content to a file, creating parent directories
pub struct FileWriteTool;

impl FileWriteTool {
    async fn write(&self, path: &str, content: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ToolError::InvalidArgument("path must not be empty".to_string()));
        }
        let full_path = ctx.validate_path(Path::new(path))?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, content).await?;

        debug!(?full_path, bytes = content.len(), "FileWriteTool::write: written");
        Ok(format!("Wrote {} bytes to {}", content.len(), path))
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &'static str {
        "file_write"
    }

    fn description(&self) -> &'static str {
        "Write content to a file. Input must be in the format 'path:content'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target_file": {
                    "type": "string",
                    "description": "File path relative to the working directory"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write"
                }
            },
            "required": ["target_file", "content"]
        })
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(input_len = input.len(), "FileWriteTool::execute: called");
        let (path, content) = input
            .split_once(':')
            .ok_or_else(|| ToolError::InvalidArgument("invalid input format, expected 'path:content'".to_string()))?;
        self.write(path, content, ctx).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!("FileWriteTool::execute_with_params: called");
        let path = required_str(params, "target_file")?;
        let content = required_str(params, "content")?;
        self.write(path, content, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_free_text_creates_dirs() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let result = FileWriteTool.execute("notes/todo.md:buy milk: two litres", &ctx).await.unwrap();

        assert!(result.contains("notes/todo.md"));
        let written = fs::read_to_string(temp.path().join("notes/todo.md")).unwrap();
        assert_eq!(written, "buy milk: two litres");
    }

    #[tokio::test]
    async fn test_write_rejects_missing_separator() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let err = FileWriteTool.execute("no separator here", &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_write_with_params() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");
        let params = json!({"target_file": "out.txt", "content": "hello"});

        FileWriteTool
            .execute_with_params(params.as_object().unwrap(), &ctx)
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("out.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_write_nested_under_relative_workdir() {
        let temp = tempfile::Builder::new().tempdir_in(".").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        FileWriteTool.execute("nested_dir/new.txt:hello", &ctx).await.unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("nested_dir/new.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_write_outside_sandbox() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let err = FileWriteTool.execute("../escape.txt:x", &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }
}
