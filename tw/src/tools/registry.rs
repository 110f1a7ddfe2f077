//! ToolRegistry - name-keyed lookup of the tools available to a run

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::builtin::{FileSearchTool, FileWriteTool, GrepSearchTool, ListDirTool, ReadFileTool, WebSearchTool};
use super::schema::validate_params;
use super::{Tool, ToolContext, ToolError};
use crate::config::SearchConfig;

/// Tool names the planner may reference even when they are not registered
///
/// Execution of an absent optional tool succeeds with an explanation instead
/// of failing the task.
pub const OPTIONAL_TOOLS: &[(&str, &str)] = &[
    (
        "web_search",
        "Web search is not available. Run with --web and set GOOGLE_SEARCH_API_KEY and \
         GOOGLE_SEARCH_ENGINE_ID to search for real-time information.",
    ),
    (
        "rag_search",
        "Local knowledge-base search is not available in this context. Use web search for external information.",
    ),
];

/// Explanation for an absent known-optional tool, if `name` is one
pub fn optional_tool_explanation(name: &str) -> Option<&'static str> {
    OPTIONAL_TOOLS
        .iter()
        .find(|(optional, _)| *optional == name)
        .map(|(_, explanation)| *explanation)
}

/// Registry of tools keyed by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        debug!("ToolRegistry::empty: called");
        Self::default()
    }

    /// Create a registry with the built-in tools
    ///
    /// `web_search` is registered when `enable_web` is set or search
    /// credentials are present in the environment.
    pub fn standard(search: &SearchConfig, enable_web: bool) -> Self {
        debug!(enable_web, "ToolRegistry::standard: called");
        let mut registry = Self::empty();
        registry.register(Arc::new(ReadFileTool));
        registry.register(Arc::new(FileWriteTool));
        registry.register(Arc::new(ListDirTool));
        registry.register(Arc::new(GrepSearchTool));
        registry.register(Arc::new(FileSearchTool));

        if enable_web || search.credentials().is_some() {
            debug!("ToolRegistry::standard: registering web_search");
            registry.register(Arc::new(WebSearchTool::new(search.clone())));
        }
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::register: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder form of [`ToolRegistry::register`]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Look up a tool by exact name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// A copy of the registry without the `excluded` names
    pub fn without(&self, excluded: &[&str]) -> Self {
        let tools = self
            .tools
            .iter()
            .filter(|(name, _)| !excluded.contains(&name.as_str()))
            .map(|(name, tool)| (name.clone(), Arc::clone(tool)))
            .collect();
        Self { tools }
    }

    /// `- name: description` lines for prompts, skipping `excluded` names
    pub fn descriptions(&self, excluded: &[&str]) -> String {
        self.tools
            .values()
            .filter(|t| !excluded.contains(&t.name()))
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Execute a tool by name with free-text input
    pub async fn execute(&self, name: &str, input: &str, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(%name, "ToolRegistry::execute: called");
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool { name: name.to_string() })?;
        tool.execute(input, ctx).await
    }

    /// Validate structured parameters against the tool's schema, then execute
    pub async fn execute_with_params(
        &self,
        name: &str,
        params: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        debug!(%name, "ToolRegistry::execute_with_params: called");
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool { name: name.to_string() })?;
        validate_params(params, &tool.schema())
            .map_err(|problems| ToolError::InvalidArgument(format!("{}: {}", name, problems.join("; "))))?;
        tool.execute_with_params(params, ctx).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}
