//! Task data model

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tools::Tool;

/// Classification of a task
///
/// Only `ResponseGeneration` changes behavior; every other type runs the
/// task's tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    InformationRetrieval,
    CostLookup,
    ResponseGeneration,
    WebSearch,
    FileOperation,
    CodeAnalysis,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::InformationRetrieval => "information_retrieval",
            TaskType::CostLookup => "cost_lookup",
            TaskType::ResponseGeneration => "response_generation",
            TaskType::WebSearch => "web_search",
            TaskType::FileOperation => "file_operation",
            TaskType::CodeAnalysis => "code_analysis",
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "information_retrieval" => Ok(TaskType::InformationRetrieval),
            "cost_lookup" => Ok(TaskType::CostLookup),
            "response_generation" => Ok(TaskType::ResponseGeneration),
            "web_search" => Ok(TaskType::WebSearch),
            "file_operation" => Ok(TaskType::FileOperation),
            "code_analysis" => Ok(TaskType::CodeAnalysis),
            other => Err(format!("unknown task type: {}", other)),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task lifecycle: `Pending -> Running -> {Completed | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A validated task as produced by planning, before it joins a graph
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: String,
    pub task_type: TaskType,
    pub description: String,
    pub input: String,
    pub tool: Option<String>,
    pub dependencies: Vec<String>,
}

impl TaskSpec {
    /// Whether the task is answered by the completion backend
    pub fn is_synthesis(&self) -> bool {
        self.task_type == TaskType::ResponseGeneration
            || self
                .tool
                .as_deref()
                .is_none_or(|t| t.is_empty() || t.eq_ignore_ascii_case("none") || t.eq_ignore_ascii_case("llm"))
    }
}

/// How a task executes, resolved once when the graph is built
#[derive(Clone)]
pub enum ToolBinding {
    /// Answered by the completion backend from dependency results
    Synthesis,
    /// A registered tool
    Tool(Arc<dyn Tool>),
    /// A known-optional tool that is not registered
    Optional { name: String, explanation: &'static str },
    /// An unknown tool; executing the task fails
    Missing(String),
}

impl fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolBinding::Synthesis => write!(f, "Synthesis"),
            ToolBinding::Tool(tool) => write!(f, "Tool({})", tool.name()),
            ToolBinding::Optional { name, .. } => write!(f, "Optional({})", name),
            ToolBinding::Missing(name) => write!(f, "Missing({})", name),
        }
    }
}

/// A task in a graph
///
/// The ID is fixed at construction. Status, result and error change only
/// through [`super::TaskGraph`] transitions.
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    task_type: TaskType,
    description: String,
    input: String,
    tool: Option<String>,
    dependencies: Vec<String>,
    binding: ToolBinding,
    pub(super) status: TaskStatus,
    pub(super) result: Option<String>,
    pub(super) error: Option<String>,
}

impl Task {
    pub(super) fn new(spec: TaskSpec, binding: ToolBinding) -> Self {
        Self {
            id: spec.id,
            task_type: spec.task_type,
            description: spec.description,
            input: spec.input,
            tool: spec.tool,
            dependencies: spec.dependencies,
            binding,
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn binding(&self) -> &ToolBinding {
        &self.binding
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(super) fn retain_dependencies(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let (kept, dropped): (Vec<String>, Vec<String>) = self.dependencies.drain(..).partition(|d| keep(d));
        self.dependencies = kept;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(task_type: TaskType, tool: Option<&str>) -> TaskSpec {
        TaskSpec {
            id: "t".to_string(),
            task_type,
            description: "d".to_string(),
            input: String::new(),
            tool: tool.map(String::from),
            dependencies: vec![],
        }
    }

    #[test]
    fn test_task_type_parse_and_display() {
        for t in [
            TaskType::InformationRetrieval,
            TaskType::CostLookup,
            TaskType::ResponseGeneration,
            TaskType::WebSearch,
            TaskType::FileOperation,
            TaskType::CodeAnalysis,
        ] {
            assert_eq!(t.as_str().parse::<TaskType>().unwrap(), t);
        }
        assert_eq!(" Response_Generation ".parse::<TaskType>().unwrap(), TaskType::ResponseGeneration);
        assert!("teleport".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert_eq!(TaskStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_is_synthesis() {
        assert!(spec(TaskType::ResponseGeneration, Some("web_search")).is_synthesis());
        assert!(spec(TaskType::InformationRetrieval, None).is_synthesis());
        assert!(spec(TaskType::InformationRetrieval, Some("none")).is_synthesis());
        assert!(spec(TaskType::InformationRetrieval, Some("LLM")).is_synthesis());
        assert!(!spec(TaskType::WebSearch, Some("web_search")).is_synthesis());
    }

    #[test]
    fn test_task_type_serde_snake_case() {
        let json = serde_json::to_string(&TaskType::CostLookup).unwrap();
        assert_eq!(json, "\"cost_lookup\"");
    }
}
