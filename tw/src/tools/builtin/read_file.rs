//! read_file tool - read file contents, optionally a line range

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError, required_str};

/// Longest line returned before truncation
const MAX_LINE_LEN: usize = 2000;

/// Read a file's contents
pub struct ReadFileTool;

impl ReadFileTool {
    async fn read(&self, path: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let full_path = ctx.validate_path(Path::new(path.trim()))?;
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| ToolError::FileNotFound {
                path: path.trim().to_string(),
                source,
            })
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the contents of a file. Input is the file path relative to the working directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target_file": {
                    "type": "string",
                    "description": "File path relative to the working directory"
                },
                "start_line": {
                    "type": "integer",
                    "description": "First line to read (1-indexed, inclusive)"
                },
                "end_line": {
                    "type": "integer",
                    "description": "Last line to read (1-indexed, inclusive)"
                }
            },
            "required": ["target_file"]
        })
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%input, "ReadFileTool::execute: called");
        self.read(input, ctx).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "ReadFileTool::execute_with_params: called");
        let path = required_str(params, "target_file")?;
        let content = self.read(path, ctx).await?;

        let start = params.get("start_line").and_then(Value::as_u64);
        let end = params.get("end_line").and_then(Value::as_u64);
        if start.is_none() && end.is_none() {
            return Ok(content);
        }

        let total = content.lines().count();
        let start = start.unwrap_or(1).max(1) as usize;
        let end = end.map(|e| e as usize).unwrap_or(total).min(total);
        if start > end {
            return Err(ToolError::InvalidArgument(format!(
                "start_line ({}) cannot be greater than end_line ({})",
                start, end
            )));
        }

        let lines: Vec<String> = content
            .lines()
            .enumerate()
            .skip(start - 1)
            .take(end + 1 - start)
            .map(|(i, line)| {
                let shown = match line.char_indices().nth(MAX_LINE_LEN) {
                    Some((cut, _)) => format!("{}...", &line[..cut]),
                    None => line.to_string(),
                };
                format!("{:>6}│{}", i + 1, shown)
            })
            .collect();

        let mut out = lines.join("\n");
        if start > 1 || end < total {
            out.push_str(&format!("\n({} of {} lines shown)", end + 1 - start, total));
        }
        Ok(out)
    }
}
