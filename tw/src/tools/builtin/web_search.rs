//! web_search tool - Google Custom Search

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::tools::{Tool, ToolContext, ToolError, required_str};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Search the web for real-time information
pub struct WebSearchTool {
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

impl WebSearchTool {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    async fn search(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument("search query must not be empty".to_string()));
        }

        let (api_key, engine_id) = self.config.credentials().ok_or_else(|| {
            ToolError::Failed(format!(
                "{} and {} environment variables must be set to use web search",
                self.config.api_key_env, self.config.engine_id_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .build()?;

        let num = self.config.max_results.clamp(1, 10).to_string();
        debug!(%query, %num, "WebSearchTool::search: sending request");
        let response = client
            .get(SEARCH_ENDPOINT)
            .query(&[("key", api_key.as_str()), ("cx", engine_id.as_str()), ("q", query), ("num", num.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "WebSearchTool::search: search API error");
            return Err(ToolError::Failed(format!("search API returned {}: {}", status, body)));
        }

        let parsed: SearchResponse = response.json().await?;
        format_results(&parsed.items, self.config.max_results)
    }
}

fn format_results(items: &[SearchItem], max_results: usize) -> Result<String, ToolError> {
    if items.is_empty() {
        return Err(ToolError::Failed("no results found".to_string()));
    }
    Ok(items
        .iter()
        .take(max_results)
        .map(|item| format!("- {}\n{}\nSource: {}", item.title, item.snippet, item.link))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for real-time information about any topic. Input is the search query."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search_term": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["search_term"]
        })
    }

    async fn execute(&self, input: &str, _ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%input, "WebSearchTool::execute: called");
        self.search(input).await
    }

    async fn execute_with_params(&self, params: &Map<String, Value>, _ctx: &ToolContext) -> Result<String, ToolError> {
        self.search(required_str(params, "search_term")?).await
    }
}
