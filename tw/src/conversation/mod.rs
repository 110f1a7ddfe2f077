//! Conversational loop - bounded tool chaining for simple goals
//!
//! The loop is a small state machine:
//!
//! ```text
//! Prompt --reply--> Answer            (done)
//!        --reply--> Act --tool--> Prompt (followup)
//! ```
//!
//! Every `Act` consumes one unit of the chain budget. A model that still
//! proposes an action once the budget is spent ends the run with
//! [`AgentError::ChainLimitExceeded`].

mod parse;

pub use parse::{Action, Reply, parse_reply};

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AgentError, or_cancelled};
use crate::events::EventEmitter;
use crate::llm::LlmClient;
use crate::memory::Memory;
use crate::prompts::PromptLoader;
use crate::tools::{ToolContext, ToolError, ToolRegistry};

/// Default bound on chained tool calls
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 5;

enum State {
    /// Waiting on the model
    Prompt(String),
    /// Model asked for a tool
    Act(Action),
    /// Model answered
    Done(String),
}

pub struct ConversationLoop {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    registry: Arc<ToolRegistry>,
    memory: Arc<Memory>,
    ctx: ToolContext,
    events: EventEmitter,
    max_chain_length: usize,
}

impl ConversationLoop {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        registry: Arc<ToolRegistry>,
        memory: Arc<Memory>,
        ctx: ToolContext,
        events: EventEmitter,
    ) -> Self {
        Self {
            llm,
            prompts,
            registry,
            memory,
            ctx,
            events,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }

    /// Builder method to change the chain bound (at least 1)
    pub fn with_max_chain_length(mut self, max_chain_length: usize) -> Self {
        self.max_chain_length = max_chain_length.max(1);
        self
    }

    /// Run the loop for one input and return the final answer
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        debug!(%input, max_chain_length = self.max_chain_length, "ConversationLoop::run: called");
        let mut actions_taken = 0;
        let mut state = State::Prompt(self.initial_prompt(input)?);

        loop {
            state = match state {
                State::Prompt(prompt) => {
                    let reply = or_cancelled(self.ctx.cancel_token(), self.llm.complete(&prompt)).await??;
                    match parse_reply(&reply) {
                        Reply::Answer(answer) => State::Done(answer),
                        Reply::Act(action) if actions_taken >= self.max_chain_length => {
                            warn!(tool = %action.tool, actions_taken, "Chain limit reached with another action pending");
                            return Err(AgentError::ChainLimitExceeded(self.max_chain_length));
                        }
                        Reply::Act(action) => State::Act(action),
                    }
                }
                State::Act(action) => {
                    actions_taken += 1;
                    info!(tool = %action.tool, step = actions_taken, max = self.max_chain_length, "Executing chained action");
                    let result = self.execute(&action).await?;
                    self.memory
                        .add_to_history(format!("Tool {} executed with result: {}", action.tool, result));
                    State::Prompt(self.followup_prompt(input, &action.tool, &result)?)
                }
                State::Done(answer) => {
                    debug!(actions_taken, "ConversationLoop::run: answered");
                    self.memory.add_to_history(format!("Agent: {}", answer));
                    return Ok(answer);
                }
            };
        }
    }

    async fn execute(&self, action: &Action) -> Result<String, AgentError> {
        debug!(tool = %action.tool, "ConversationLoop::execute: called");
        if !self.registry.has_tool(&action.tool) {
            warn!(tool = %action.tool, available = ?self.registry.names(), "Model asked for an unknown tool");
            return Err(AgentError::ToolNotFound(action.tool.clone()));
        }

        let started = Instant::now();
        let call = async {
            match action.params() {
                Some(params) => self.registry.execute_with_params(&action.tool, &params, &self.ctx).await,
                None => self.registry.execute(&action.tool, &action.input, &self.ctx).await,
            }
        };
        let outcome = or_cancelled(self.ctx.cancel_token(), call).await?;
        let elapsed = started.elapsed().as_millis() as u64;
        self.events
            .tool_invoked(&action.tool, &action.input, outcome.is_ok(), elapsed);

        outcome.map_err(|source| match source {
            ToolError::UnknownTool { name } => AgentError::ToolNotFound(name),
            source => AgentError::ToolExecution {
                tool: action.tool.clone(),
                source,
            },
        })
    }

    fn initial_prompt(&self, input: &str) -> Result<String, AgentError> {
        self.prompts
            .render(
                "conversation",
                &json!({
                    "tools": self.registry.descriptions(&[]),
                    "history": self.memory.formatted_history(),
                    "input": input,
                }),
            )
            .map_err(|e| AgentError::Prompt(e.to_string()))
    }

    fn followup_prompt(&self, input: &str, tool: &str, result: &str) -> Result<String, AgentError> {
        self.prompts
            .render(
                "followup",
                &json!({
                    "input": input,
                    "tool": tool,
                    "result": result,
                }),
            )
            .map_err(|e| AgentError::Prompt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::tools::builtin::{ListDirTool, ReadFileTool};
    use tempfile::{TempDir, tempdir};
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        _dir: TempDir,
        llm: Arc<MockLlmClient>,
        memory: Arc<Memory>,
        conversation: ConversationLoop,
    }

    fn fixture(replies: Vec<&str>, cancel: CancellationToken) -> Fixture {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "buy milk\n").unwrap();
        let llm = Arc::new(MockLlmClient::new(replies));
        let memory = Arc::new(Memory::new());
        let registry = ToolRegistry::empty()
            .with_tool(Arc::new(ListDirTool))
            .with_tool(Arc::new(ReadFileTool));
        let conversation = ConversationLoop::new(
            llm.clone(),
            Arc::new(PromptLoader::embedded_only()),
            Arc::new(registry),
            memory.clone(),
            ToolContext::new(dir.path().to_path_buf(), "run-test").with_cancel_token(cancel),
            EventEmitter::detached("run-test"),
        );
        Fixture {
            _dir: dir,
            llm,
            memory,
            conversation,
        }
    }

    #[tokio::test]
    async fn test_direct_answer_returned_unchanged() {
        let f = fixture(vec!["<think>easy</think>4"], CancellationToken::new());

        let answer = f.conversation.run("What is 2+2").await.unwrap();

        assert_eq!(answer, "4");
        assert_eq!(f.llm.call_count(), 1);
        assert!(f.llm.prompts()[0].contains("Current user input: What is 2+2"));
        assert_eq!(f.memory.history(), vec!["Agent: 4".to_string()]);
    }

    #[tokio::test]
    async fn test_tool_result_fed_into_followup() {
        let f = fixture(
            vec![
                "ACTION: list_dir\nINPUT: .",
                "ACTION: read_file\nINPUT: notes.txt",
                "Your notes say: buy milk",
            ],
            CancellationToken::new(),
        );

        let answer = f.conversation.run("What do my notes say?").await.unwrap();

        assert_eq!(answer, "Your notes say: buy milk");
        let prompts = f.llm.prompts();
        assert!(prompts[1].contains("Tool used: list_dir"));
        assert!(prompts[1].contains("notes.txt"));
        assert!(prompts[2].contains("Tool used: read_file"));
        assert!(prompts[2].contains("buy milk"));

        let history = f.memory.history();
        assert_eq!(history.len(), 3);
        assert!(history[0].starts_with("Tool list_dir executed with result: "));
        assert!(history[1].starts_with("Tool read_file executed with result: "));
        assert_eq!(history[2], "Agent: Your notes say: buy milk");
    }

    #[tokio::test]
    async fn test_structured_input_uses_params() {
        let f = fixture(
            vec![
                r#"ACTION: read_file
INPUT: {"target_file": "notes.txt"}"#,
                "done",
            ],
            CancellationToken::new(),
        );

        f.conversation.run("read my notes").await.unwrap();
        assert!(f.llm.prompts()[1].contains("buy milk"));
    }

    #[tokio::test]
    async fn test_chain_limit_is_fatal_after_exact_bound() {
        let replies = vec!["ACTION: list_dir\nINPUT: ."; 10];
        let f = fixture(replies, CancellationToken::new());
        let conversation = f.conversation.with_max_chain_length(3);

        let err = conversation.run("loop forever").await.unwrap_err();

        assert!(matches!(err, AgentError::ChainLimitExceeded(3)));
        // One initial prompt plus one followup per executed action
        assert_eq!(f.llm.call_count(), 4);
        let tool_entries = f.memory.history().iter().filter(|h| h.starts_with("Tool list_dir")).count();
        assert_eq!(tool_entries, 3);
    }

    #[tokio::test]
    async fn test_default_chain_limit_is_five() {
        let replies = vec!["ACTION: list_dir\nINPUT: ."; 10];
        let f = fixture(replies, CancellationToken::new());

        let err = f.conversation.run("loop forever").await.unwrap_err();

        assert!(matches!(err, AgentError::ChainLimitExceeded(5)));
        assert_eq!(f.llm.call_count(), 6);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fatal() {
        let f = fixture(vec!["ACTION: teleport\nINPUT: mars"], CancellationToken::new());

        let err = f.conversation.run("go").await.unwrap_err();

        assert!(matches!(err, AgentError::ToolNotFound(ref name) if name == "teleport"));
        assert!(f.memory.history().is_empty());
    }

    #[tokio::test]
    async fn test_tool_error_is_fatal() {
        let f = fixture(vec!["ACTION: read_file\nINPUT: missing.txt"], CancellationToken::new());

        let err = f.conversation.run("read it").await.unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution { ref tool, .. } if tool == "read_file"));
    }

    #[tokio::test]
    async fn test_cancelled_before_backend_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let f = fixture(vec!["4"], cancel);

        let err = f.conversation.run("What is 2+2").await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }

    #[tokio::test]
    async fn test_history_appears_in_next_prompt() {
        let f = fixture(vec!["first", "second"], CancellationToken::new());
        f.memory.add_to_history("User: hello");

        f.conversation.run("hello").await.unwrap();
        f.conversation.run("again").await.unwrap();

        let prompts = f.llm.prompts();
        assert!(prompts[0].contains("User: hello"));
        assert!(prompts[1].contains("Agent: first"));
    }
}
