//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool lookup or execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Path {path} escapes working directory {workdir}")]
    SandboxViolation { path: PathBuf, workdir: PathBuf },

    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Failed(String),

    #[error("Tool execution cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_violation_message() {
        let err = ToolError::SandboxViolation {
            path: PathBuf::from("/etc/passwd"),
            workdir: PathBuf::from("/tmp/work"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        assert!(msg.contains("/tmp/work"));
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = ToolError::UnknownTool {
            name: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "Tool not found: teleport");
    }
}
