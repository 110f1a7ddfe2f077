//! grep_search tool - regex search across the working directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use grep_regex::RegexMatcherBuilder;
use grep_searcher::sinks::UTF8;
use grep_searcher::{BinaryDetection, SearcherBuilder};
use serde_json::{Map, Value, json};
use tracing::debug;
use walkdir::WalkDir;

use super::run_blocking;
use crate::tools::{Tool, ToolContext, ToolError, required_str};

/// Maximum number of matching lines returned
const MAX_MATCHES: usize = 50;

/// Search file contents with the ripgrep engine
pub struct GrepSearchTool;

#[derive(Debug, Clone, PartialEq)]
struct GrepQuery {
    pattern: String,
    include: Option<String>,
    case_sensitive: bool,
}

impl GrepQuery {
    /// Parse `pattern|glob|case_sensitive`; only the pattern is required
    fn parse(input: &str) -> Result<Self, ToolError> {
        let mut parts = input.splitn(3, '|');
        let pattern = parts.next().unwrap_or_default().trim().to_string();
        if pattern.is_empty() {
            return Err(ToolError::InvalidArgument("pattern must not be empty".to_string()));
        }
        let include = parts.next().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        let case_sensitive = parts
            .next()
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false);
        Ok(Self {
            pattern,
            include,
            case_sensitive,
        })
    }
}

impl GrepSearchTool {
    fn search(query: &GrepQuery, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?query, "GrepSearchTool::search: called");
        let root = ctx.validate_path(Path::new("."))?;

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!query.case_sensitive)
            .build(&query.pattern)
            .map_err(|e| ToolError::InvalidArgument(format!("Invalid regex pattern: {}", e)))?;

        let glob = match &query.include {
            Some(g) => Some(
                glob::Pattern::new(g).map_err(|e| ToolError::InvalidArgument(format!("Invalid glob '{}': {}", g, e)))?,
            ),
            None => None,
        };

        let mut files: Vec<PathBuf> = Vec::new();
        let walk = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());
        for entry in walk {
            ctx.check_cancelled()?;
            let included = match &glob {
                Some(pattern) => entry.file_name().to_str().is_some_and(|n| pattern.matches(n)),
                None => true,
            };
            if included {
                files.push(entry.into_path());
            }
        }
        debug!(file_count = files.len(), "GrepSearchTool::search: files to search");

        let mut searcher = SearcherBuilder::new().binary_detection(BinaryDetection::quit(b'\x00')).build();
        let mut lines = Vec::new();

        'files: for file in files {
            ctx.check_cancelled()?;
            let display = ctx.display_path(&file);
            let mut found = Vec::new();
            let result = searcher.search_path(
                &matcher,
                &file,
                UTF8(|line_number, text| {
                    found.push(format!("{}:{}: {}", display, line_number, text.trim()));
                    Ok(true)
                }),
            );
            if let Err(e) = result {
                debug!(?file, error = %e, "GrepSearchTool::search: skipping unreadable file");
                continue;
            }
            for line in found {
                if lines.len() >= MAX_MATCHES {
                    lines.push(format!("... results truncated at {} matches", MAX_MATCHES));
                    break 'files;
                }
                lines.push(line);
            }
        }

        if lines.is_empty() {
            Ok("No matches found.".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}

#[async_trait]
impl Tool for GrepSearchTool {
    fn name(&self) -> &'static str {
        "grep_search"
    }

    fn description(&self) -> &'static str {
        "Fast text-based regex search in files. Input: pattern|glob|case_sensitive (only the pattern is required), e.g. fn main|*.rs|true. Results are capped at 50 matches."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "include_pattern": {
                    "type": "string",
                    "description": "Glob pattern for file names to include (e.g. '*.rs')"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Whether the search is case sensitive (default: false)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%input, "GrepSearchTool::execute: called");
        let query = GrepQuery::parse(input)?;
        run_blocking(ctx, move |ctx| Self::search(&query, ctx)).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, ctx: &ToolContext) -> Result<String, ToolError> {
        let query = GrepQuery {
            pattern: required_str(params, "query")?.to_string(),
            include: params.get("include_pattern").and_then(Value::as_str).map(String::from),
            case_sensitive: params.get("case_sensitive").and_then(Value::as_bool).unwrap_or(false),
        };
        run_blocking(ctx, move |ctx| Self::search(&query, ctx)).await
    }
}
