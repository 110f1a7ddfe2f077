//! Planning error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors that prevent a task graph from being built
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("Completion backend failed during planning: {0}")]
    Backend(#[from] LlmError),

    #[error("No valid tasks found in decomposition")]
    NoValidTasks,

    #[error(
        "This query requires web search but web search is not enabled.\n\nQuery: {query}\n\n\
         To enable web search:\n\
         1. Add the -w flag: tw run -w \"your query\"\n\
         2. Set GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID"
    )]
    WebSearchRequired { query: String },

    #[error("Failed to render planning prompt: {0}")]
    Prompt(String),
}
