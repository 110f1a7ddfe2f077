//! file_search tool - fuzzy search over file paths

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;
use walkdir::WalkDir;

use super::run_blocking;
use crate::tools::{Tool, ToolContext, ToolError, required_str};

/// Maximum number of paths returned
const MAX_RESULTS: usize = 10;

/// Find files whose relative path fuzzily matches a query
pub struct FileSearchTool;

/// Case-insensitive subsequence match; lower scores are tighter matches
fn fuzzy_score(candidate: &str, query: &str) -> Option<usize> {
    let candidate = candidate.to_lowercase();
    let query = query.to_lowercase();
    if candidate.contains(&query) {
        return Some(candidate.len() - query.len());
    }

    let mut gaps = 0;
    let mut chars = candidate.chars();
    for q in query.chars() {
        let mut skipped = 0;
        loop {
            match chars.next() {
                Some(c) if c == q => break,
                Some(_) => skipped += 1,
                None => return None,
            }
        }
        gaps += skipped;
    }
    // Substring hits always rank ahead of scattered matches
    Some(candidate.len() + gaps)
}

impl FileSearchTool {
    fn search(query: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument("query must not be empty".to_string()));
        }
        let root = ctx.validate_path(std::path::Path::new("."))?;

        let mut matches: Vec<(usize, String)> = Vec::new();
        let walk = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());
        for entry in walk {
            ctx.check_cancelled()?;
            let relative = ctx.display_path(entry.path());
            if let Some(score) = fuzzy_score(&relative, query) {
                matches.push((score, relative));
            }
        }

        matches.sort();
        debug!(match_count = matches.len(), "FileSearchTool::search: matches collected");

        if matches.is_empty() {
            return Ok(format!("No files matching '{}'.", query));
        }
        let total = matches.len();
        let mut out: Vec<String> = matches.into_iter().take(MAX_RESULTS).map(|(_, p)| p).collect();
        if total > MAX_RESULTS {
            out.push(format!("... {} more, refine the query", total - MAX_RESULTS));
        }
        Ok(out.join("\n"))
    }
}

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &'static str {
        "file_search"
    }

    fn description(&self) -> &'static str {
        "Fast file search using fuzzy matching against file paths. Use when you know part of a file name. Results are capped at 10."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Part of the file name or path to look for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%input, "FileSearchTool::execute: called");
        let query = input.to_string();
        run_blocking(ctx, move |ctx| Self::search(&query, ctx)).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError> {
        let query = required_str(params, "query")?.to_string();
        run_blocking(ctx, move |ctx| Self::search(&query, ctx)).await
    }
}
