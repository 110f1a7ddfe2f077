//! Decomposer - turns a goal into a validated task graph

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::PlanningError;
use super::parser::{ExcludedTools, parse_blocks, validate_blocks};
use crate::graph::TaskGraph;
use crate::llm::{LlmClient, strip_think_blocks};
use crate::prompts::PromptLoader;
use crate::tools::ToolRegistry;

/// Tools hidden from the planner, with the tool a plan naming them gets instead
pub const EXCLUDED_TOOLS: ExcludedTools<'static> = &[("rag_search", Some("web_search"))];

/// Goal fragments that indicate networked search is needed
const WEB_KEYWORDS: &[&str] = &[
    "site web",
    "website",
    ".com",
    ".sh",
    ".org",
    "internet",
    "recherche en ligne",
    "online search",
    "va sur",
    "go to",
    "search",
    "look up",
    "find",
    "ollama models",
    "benchmarks",
    "compare",
];

/// Whether the goal reads like it needs web search
pub fn needs_web_search(goal: &str) -> bool {
    let goal = goal.to_lowercase();
    WEB_KEYWORDS.iter().any(|k| goal.contains(k))
}

/// Builds task graphs with the completion backend
pub struct Decomposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
}

impl Decomposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self { llm, prompts }
    }

    /// Render the planning prompt
    ///
    /// Fails without contacting the backend when the goal needs web search
    /// and no search tool is registered.
    pub fn build_prompt(&self, goal: &str, registry: &ToolRegistry) -> Result<String, PlanningError> {
        debug!(%goal, "Decomposer::build_prompt: called");
        if !registry.has_tool("web_search") && needs_web_search(goal) {
            info!("Goal needs web search but web_search is not registered");
            return Err(PlanningError::WebSearchRequired { query: goal.to_string() });
        }

        let excluded: Vec<&str> = EXCLUDED_TOOLS.iter().map(|(name, _)| *name).collect();
        let visible = registry.without(&excluded);
        self.prompts
            .render(
                "decompose",
                &json!({
                    "tools": visible.descriptions(&[]),
                    "query": goal,
                }),
            )
            .map_err(|e| PlanningError::Prompt(e.to_string()))
    }

    /// Decompose a goal into a task graph bound against `registry`
    pub async fn decompose(&self, goal: &str, registry: &ToolRegistry) -> Result<TaskGraph, PlanningError> {
        debug!(%goal, "Decomposer::decompose: called");
        let prompt = self.build_prompt(goal, registry)?;
        let reply = self.llm.complete(&prompt).await?;
        let reply = strip_think_blocks(&reply);
        debug!(reply_len = reply.len(), "Decomposer::decompose: plan received");

        let specs = validate_blocks(parse_blocks(&reply), EXCLUDED_TOOLS);
        let graph = TaskGraph::from_specs(specs, registry);
        if graph.is_empty() {
            return Err(PlanningError::NoValidTasks);
        }

        info!(task_count = graph.len(), "Decomposed goal into tasks");
        Ok(graph)
    }
}
