//! Response synthesis - folds a finished task graph into one answer

use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::graph::TaskGraph;
use crate::llm::{LlmClient, strip_think_blocks};
use crate::prompts::PromptLoader;

pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self { llm, prompts }
    }

    /// Ask the backend for one answer covering every task's outcome
    ///
    /// Completed tasks contribute `description: result`; failed tasks
    /// contribute `description: FAILED - error` so the answer can say what
    /// could not be determined.
    pub async fn synthesize(&self, goal: &str, graph: &TaskGraph) -> Result<String, AgentError> {
        debug!(%goal, task_count = graph.len(), "Synthesizer::synthesize: called");
        let prompt = self.build_prompt(goal, graph)?;
        let reply = self.llm.complete(&prompt).await?;
        Ok(strip_think_blocks(&reply))
    }

    fn build_prompt(&self, goal: &str, graph: &TaskGraph) -> Result<String, AgentError> {
        self.prompts
            .render(
                "synthesize",
                &serde_json::json!({
                    "query": goal,
                    "results": graph.outcomes(),
                }),
            )
            .map_err(|e| AgentError::Prompt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{TaskSpec, TaskType};
    use crate::llm::client::mock::MockLlmClient;
    use crate::tools::ToolRegistry;

    fn graph() -> TaskGraph {
        let specs = vec![
            TaskSpec {
                id: "t1".to_string(),
                task_type: TaskType::InformationRetrieval,
                description: "Look up the venue".to_string(),
                input: "venue".to_string(),
                tool: Some("web_search".to_string()),
                dependencies: vec![],
            },
            TaskSpec {
                id: "t2".to_string(),
                task_type: TaskType::InformationRetrieval,
                description: "Check ticket prices".to_string(),
                input: "prices".to_string(),
                tool: Some("web_search".to_string()),
                dependencies: vec![],
            },
        ];
        let mut graph = TaskGraph::from_specs(specs, &ToolRegistry::empty());
        graph.mark_running("t1");
        graph.mark_completed("t1", "Lisbon, Portugal".to_string());
        graph.mark_running("t2");
        graph.mark_failed("t2", "rate limited".to_string());
        graph
    }

    #[tokio::test]
    async fn test_prompt_lists_completed_and_failed_tasks() {
        let llm = Arc::new(MockLlmClient::new(vec!["<think>hmm</think>The event is in Lisbon."]));
        let synthesizer = Synthesizer::new(llm.clone(), Arc::new(PromptLoader::embedded_only()));

        let answer = synthesizer.synthesize("Where and how much?", &graph()).await.unwrap();

        assert_eq!(answer, "The event is in Lisbon.");
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Original request: Where and how much?"));
        assert!(prompt.contains("Look up the venue: Lisbon, Portugal"));
        assert!(prompt.contains("Check ticket prices: FAILED - rate limited"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let synthesizer = Synthesizer::new(
            Arc::new(MockLlmClient::new(vec![])),
            Arc::new(PromptLoader::embedded_only()),
        );

        let err = synthesizer.synthesize("goal", &graph()).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
    }
}
