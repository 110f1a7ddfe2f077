//! Task dispatch - runs one task against its bound tool or the backend

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::events::EventEmitter;
use crate::graph::{TaskGraph, ToolBinding};
use crate::llm::{LlmClient, strip_think_blocks};
use crate::memory::Memory;
use crate::prompts::{DependencyContext, PromptLoader};
use crate::tools::ToolContext;

/// Everything needed to run one task, detached from the graph
///
/// Built when the task is dispatched, so in-flight work never borrows the
/// graph the scheduler is updating.
#[derive(Debug, Clone)]
pub struct TaskJob {
    pub id: String,
    pub description: String,
    pub input: String,
    pub binding: ToolBinding,
    pub dependencies: Vec<DependencyContext>,
}

impl TaskJob {
    /// Snapshot a task and its completed dependencies
    pub fn from_graph(graph: &TaskGraph, id: &str) -> Option<Self> {
        let task = graph.get(id)?;
        Some(Self {
            id: task.id().to_string(),
            description: task.description().to_string(),
            input: task.input().to_string(),
            binding: task.binding().clone(),
            dependencies: graph.dependency_context(id),
        })
    }
}

/// Executes task jobs
pub struct TaskRunner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    memory: Arc<Memory>,
    ctx: ToolContext,
    events: EventEmitter,
}

impl TaskRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        memory: Arc<Memory>,
        ctx: ToolContext,
        events: EventEmitter,
    ) -> Self {
        Self {
            llm,
            prompts,
            memory,
            ctx,
            events,
        }
    }

    /// Run a job, returning its result or the error it ends with
    pub async fn run(&self, job: &TaskJob) -> Result<String, AgentError> {
        debug!(task_id = %job.id, binding = ?job.binding, "TaskRunner::run: called");
        match &job.binding {
            ToolBinding::Synthesis => self.synthesize(job).await,
            ToolBinding::Tool(tool) => {
                let started = Instant::now();
                let outcome = tool.execute(&job.input, &self.ctx).await;
                let elapsed = started.elapsed().as_millis() as u64;
                self.events.tool_invoked(tool.name(), &job.input, outcome.is_ok(), elapsed);

                let result = outcome.map_err(|source| AgentError::ToolExecution {
                    tool: tool.name().to_string(),
                    source,
                })?;
                self.memory
                    .add_to_history(format!("Tool {} executed with result: {}", tool.name(), result));
                Ok(result)
            }
            ToolBinding::Optional { name, explanation } => {
                warn!(task_id = %job.id, tool = %name, "Optional tool not available, answering with explanation");
                self.events
                    .warning(&job.id, &format!("{} is not available; task answered with an explanation", name));
                Ok(explanation.to_string())
            }
            ToolBinding::Missing(name) => Err(AgentError::ToolNotFound(name.clone())),
        }
    }

    async fn synthesize(&self, job: &TaskJob) -> Result<String, AgentError> {
        let prompt = self
            .prompts
            .render(
                "task",
                &json!({
                    "description": job.description,
                    "dependencies": job.dependencies,
                    "input": job.input,
                }),
            )
            .map_err(|e| AgentError::Prompt(e.to_string()))?;
        let reply = self.llm.complete(&prompt).await?;
        Ok(strip_think_blocks(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{TaskSpec, TaskType};
    use crate::llm::client::mock::MockLlmClient;
    use crate::tools::ToolRegistry;
    use crate::tools::builtin::ReadFileTool;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn runner(llm: Arc<MockLlmClient>, workdir: PathBuf, memory: Arc<Memory>) -> TaskRunner {
        TaskRunner::new(
            llm,
            Arc::new(PromptLoader::embedded_only()),
            memory,
            ToolContext::new(workdir, "run-test"),
            EventEmitter::detached("run-test"),
        )
    }

    fn spec(id: &str, task_type: TaskType, tool: Option<&str>, input: &str, deps: &[&str]) -> TaskSpec {
        TaskSpec {
            id: id.to_string(),
            task_type,
            description: format!("{} description", id),
            input: input.to_string(),
            tool: tool.map(String::from),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_synthesis_includes_dependency_results() {
        let temp = tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::new(vec!["<think>hmm</think>The answer"]));
        let mut graph = TaskGraph::from_specs(
            vec![
                spec("a", TaskType::WebSearch, Some("web_search"), "q", &[]),
                spec("b", TaskType::ResponseGeneration, None, "write it up", &["a"]),
            ],
            &ToolRegistry::empty(),
        );
        graph.mark_running("a");
        graph.mark_completed("a", "found 42".to_string());

        let job = TaskJob::from_graph(&graph, "b").unwrap();
        let result = runner(llm.clone(), temp.path().to_path_buf(), Arc::new(Memory::new()))
            .run(&job)
            .await
            .unwrap();

        assert_eq!(result, "The answer");
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Task: b description"));
        assert!(prompt.contains("- a description: found 42"));
        assert!(prompt.contains("Based on the above context, write it up"));
    }

    #[tokio::test]
    async fn test_registered_tool_gets_task_input() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("notes.txt"), "remember the milk").unwrap();
        let registry = ToolRegistry::empty().with_tool(Arc::new(ReadFileTool));
        let graph = TaskGraph::from_specs(
            vec![spec("r", TaskType::FileOperation, Some("read_file"), "notes.txt", &[])],
            &registry,
        );
        let memory = Arc::new(Memory::new());

        let job = TaskJob::from_graph(&graph, "r").unwrap();
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let result = runner(llm.clone(), temp.path().to_path_buf(), memory.clone())
            .run(&job)
            .await
            .unwrap();

        assert!(result.contains("remember the milk"));
        assert_eq!(llm.call_count(), 0);
        assert!(memory.history()[0].starts_with("Tool read_file executed with result:"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_tool_execution_error() {
        let temp = tempdir().unwrap();
        let registry = ToolRegistry::empty().with_tool(Arc::new(ReadFileTool));
        let graph = TaskGraph::from_specs(
            vec![spec("r", TaskType::FileOperation, Some("read_file"), "missing.txt", &[])],
            &registry,
        );

        let job = TaskJob::from_graph(&graph, "r").unwrap();
        let err = runner(Arc::new(MockLlmClient::new(vec![])), temp.path().to_path_buf(), Arc::new(Memory::new()))
            .run(&job)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution { ref tool, .. } if tool == "read_file"));
    }

    #[tokio::test]
    async fn test_optional_tool_succeeds_with_explanation() {
        let temp = tempdir().unwrap();
        let graph = TaskGraph::from_specs(
            vec![spec("w", TaskType::WebSearch, Some("web_search"), "news", &[])],
            &ToolRegistry::empty(),
        );

        let job = TaskJob::from_graph(&graph, "w").unwrap();
        let result = runner(Arc::new(MockLlmClient::new(vec![])), temp.path().to_path_buf(), Arc::new(Memory::new()))
            .run(&job)
            .await
            .unwrap();

        assert!(result.contains("Web search is not available"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_not_found() {
        let temp = tempdir().unwrap();
        let graph = TaskGraph::from_specs(
            vec![spec("m", TaskType::CostLookup, Some("flight_prices"), "YUL-LIS", &[])],
            &ToolRegistry::empty(),
        );

        let job = TaskJob::from_graph(&graph, "m").unwrap();
        let err = runner(Arc::new(MockLlmClient::new(vec![])), temp.path().to_path_buf(), Arc::new(Memory::new()))
            .run(&job)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Tool not found: flight_prices");
    }
}
