//! Run-level error taxonomy
//!
//! Individual task failures are recorded on the task graph and never surface
//! here; these are the conditions that end a run.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm::LlmError;
use crate::planning::PlanningError;
use crate::tools::ToolError;

/// Errors that end a run, or that a task records as its terminal error
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to decompose query: {0}")]
    Planning(#[from] PlanningError),

    #[error("{}", stall_message(.blocked, .unresolved))]
    Stalled { blocked: Vec<String>, unresolved: Vec<String> },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool {tool} failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("Reached maximum number of chained actions ({0})")]
    ChainLimitExceeded(usize),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Completion backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl AgentError {
    /// Whether this error came from a stall rather than a hard failure
    pub fn is_stall(&self) -> bool {
        matches!(self, AgentError::Stalled { .. })
    }
}

fn stall_message(blocked: &[String], unresolved: &[String]) -> String {
    let mut parts = Vec::new();
    if !blocked.is_empty() {
        parts.push(format!("tasks blocked by failed dependency: {}", blocked.join(", ")));
    }
    if !unresolved.is_empty() {
        parts.push(format!("circular dependency among tasks: {}", unresolved.join(", ")));
    }
    format!("Execution stalled; {}", parts.join("; "))
}

/// Await `fut` unless `token` is cancelled first
pub(crate) async fn or_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Result<F::Output, AgentError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AgentError::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stall_message_distinguishes_causes() {
        let blocked = AgentError::Stalled {
            blocked: vec!["t2".to_string()],
            unresolved: vec![],
        };
        assert_eq!(blocked.to_string(), "Execution stalled; tasks blocked by failed dependency: t2");

        let cycle = AgentError::Stalled {
            blocked: vec![],
            unresolved: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(cycle.to_string(), "Execution stalled; circular dependency among tasks: a, b");
        assert!(cycle.is_stall());

        let both = AgentError::Stalled {
            blocked: vec!["x".to_string()],
            unresolved: vec!["y".to_string()],
        };
        assert!(both.to_string().contains("; circular"));
    }

    #[test]
    fn test_tool_not_found_message() {
        let err = AgentError::ToolNotFound("flight_booker".to_string());
        assert_eq!(err.to_string(), "Tool not found: flight_booker");
        assert!(!err.is_stall());
    }

    #[tokio::test]
    async fn test_or_cancelled_passes_through() {
        let token = CancellationToken::new();
        assert_eq!(or_cancelled(&token, async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_or_cancelled_abandons_pending_future() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let result = or_cancelled(&token, tokio::time::sleep(Duration::from_secs(60))).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
