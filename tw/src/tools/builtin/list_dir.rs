//! list_dir tool - list files and directories

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError};

/// List the entries of a directory
pub struct ListDirTool;

impl ListDirTool {
    async fn list(&self, path: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = match path.trim() {
            "" => ".",
            p => p,
        };
        let full_path = ctx.validate_path(Path::new(path))?;

        if !full_path.is_dir() {
            return Err(ToolError::InvalidArgument(format!("{} is not a directory", path)));
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&full_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = match entry.file_type().await {
                Ok(ft) => ft.is_dir(),
                Err(_) => {
                    debug!(%name, "ListDirTool::list: failed to get file type, skipping entry");
                    continue;
                }
            };
            entries.push(if is_dir { format!("{}/", name) } else { name });
        }

        entries.sort();
        debug!(entries_count = %entries.len(), "ListDirTool::list: entries collected");

        if entries.is_empty() {
            Ok("(empty directory)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &'static str {
        "list_dir"
    }

    fn description(&self) -> &'static str {
        "List the contents of a directory. Use this first to discover which files exist. Input is a directory path (default: .)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_workspace_path": {
                    "type": "string",
                    "description": "Directory path relative to the working directory"
                }
            }
        })
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%input, "ListDirTool::execute: called");
        self.list(input, ctx).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = params.get("relative_workspace_path").and_then(Value::as_str).unwrap_or(".");
        self.list(path, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_dir_sorted_with_dir_suffix() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.txt"), "").unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");
        let result = ListDirTool.execute(".", &ctx).await.unwrap();

        assert_eq!(result, "a.txt\nb.txt\nsrc/");
    }

    #[tokio::test]
    async fn test_list_dir_empty_input_means_workdir() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        assert_eq!(ListDirTool.execute("", &ctx).await.unwrap(), "(empty directory)");
    }

    #[tokio::test]
    async fn test_list_dir_rejects_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("f.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        assert!(ListDirTool.execute("f.txt", &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_list_dir_with_params() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/readme.md"), "").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test");

        let params = json!({"relative_workspace_path": "docs"});
        let result = ListDirTool
            .execute_with_params(params.as_object().unwrap(), &ctx)
            .await
            .unwrap();
        assert_eq!(result, "readme.md");
    }
}
