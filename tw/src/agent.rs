//! Agent - the entry point that turns one goal into one answer
//!
//! In orchestrated mode a goal is classified first. Simple goals go to the
//! conversational loop; complex goals are decomposed into a task graph,
//! executed wave by wave, and synthesized into a single answer. In
//! conversational mode every goal goes to the loop.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{Classifier, Complexity};
use crate::config::AgentConfig;
use crate::conversation::ConversationLoop;
use crate::error::{AgentError, or_cancelled};
use crate::events::{EventBus, EventEmitter};
use crate::executor::{Scheduler, TaskRunner};
use crate::graph::TaskStatus;
use crate::llm::LlmClient;
use crate::memory::Memory;
use crate::planning::Decomposer;
use crate::prompts::PromptLoader;
use crate::synthesis::Synthesizer;
use crate::tools::{ToolContext, ToolRegistry};

/// How the agent routes goals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AgentMode {
    /// Classify, then plan complex goals and chat through simple ones
    #[default]
    Orchestrated,
    /// Always use the bounded conversational loop
    Conversational,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Orchestrated => "orchestrated",
            AgentMode::Conversational => "conversational",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "orchestrated" => Ok(AgentMode::Orchestrated),
            "conversational" => Ok(AgentMode::Conversational),
            other => Err(format!("Unknown agent mode: {}", other)),
        }
    }
}

/// Goal-driven agent over a completion backend and a tool registry
///
/// Memory persists across runs of the same agent. The cancellation token
/// is shared by every run; once cancelled, later runs fail immediately.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    memory: Arc<Memory>,
    prompts: Arc<PromptLoader>,
    config: AgentConfig,
    mode: AgentMode,
    bus: Option<Arc<EventBus>>,
    cancel: CancellationToken,
}

impl Agent {
    /// Create an agent; prompt overrides are looked up under `config.workdir`
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry, config: AgentConfig) -> Self {
        debug!(tools = ?registry.names(), ?config, "Agent::new: called");
        let prompts = Arc::new(PromptLoader::new(&config.workdir));
        Self {
            llm,
            registry: Arc::new(registry),
            memory: Arc::new(Memory::new()),
            prompts,
            config,
            mode: AgentMode::default(),
            bus: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder method to set the routing mode
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to publish run events on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builder method to replace the prompt loader
    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Token that cancels the current and every later run
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Produce an answer for `goal`
    pub async fn run(&self, goal: &str) -> Result<String, AgentError> {
        let run_id = Uuid::now_v7().to_string();
        debug!(%run_id, %goal, mode = %self.mode, "Agent::run: called");
        let events = match &self.bus {
            Some(bus) => bus.emitter_for(&run_id),
            None => EventEmitter::detached(&run_id),
        };

        let started = Instant::now();
        info!(%run_id, mode = %self.mode, "Starting run");
        events.run_started(goal, self.mode.as_str());
        self.memory.add_to_history(format!("User: {}", goal));

        let outcome = self.route(goal, &run_id, &events).await;

        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => info!(%run_id, duration_ms, "Run completed"),
            Err(e) => warn!(%run_id, duration_ms, error = %e, "Run failed"),
        }
        events.run_completed(outcome.is_ok(), duration_ms);
        outcome
    }

    async fn route(&self, goal: &str, run_id: &str, events: &EventEmitter) -> Result<String, AgentError> {
        let ctx = ToolContext::new(self.config.workdir.clone(), run_id).with_cancel_token(self.cancel.clone());

        let complexity = match self.mode {
            AgentMode::Conversational => Complexity::Simple,
            AgentMode::Orchestrated => {
                let classifier = Classifier::new(self.llm.clone(), self.prompts.clone());
                let complexity = or_cancelled(&self.cancel, classifier.classify(goal)).await?;
                info!(%run_id, %complexity, "Goal classified");
                events.classified(&complexity.to_string());
                complexity
            }
        };

        match complexity {
            Complexity::Simple => {
                let conversation = ConversationLoop::new(
                    self.llm.clone(),
                    self.prompts.clone(),
                    self.registry.clone(),
                    self.memory.clone(),
                    ctx,
                    events.clone(),
                )
                .with_max_chain_length(self.config.max_chain_length);
                conversation.run(goal).await
            }
            Complexity::Complex => self.orchestrate(goal, ctx, events).await,
        }
    }

    async fn orchestrate(&self, goal: &str, ctx: ToolContext, events: &EventEmitter) -> Result<String, AgentError> {
        debug!(%goal, "Agent::orchestrate: called");
        let decomposer = Decomposer::new(self.llm.clone(), self.prompts.clone());
        let mut graph = or_cancelled(&self.cancel, decomposer.decompose(goal, &self.registry)).await??;
        info!(task_count = graph.len(), "Plan created");
        events.plan_created(graph.planned());

        let runner = TaskRunner::new(
            self.llm.clone(),
            self.prompts.clone(),
            self.memory.clone(),
            ctx,
            events.clone(),
        );
        let scheduler = Scheduler::new(
            Arc::new(runner),
            self.config.max_parallel_tasks,
            events.clone(),
            self.cancel.clone(),
        );
        scheduler.execute(&mut graph).await?;

        let completed = graph.count(TaskStatus::Completed);
        let failed = graph.count(TaskStatus::Failed);
        info!(completed, failed, "Synthesizing answer");
        events.synthesizing(completed, failed);

        let synthesizer = Synthesizer::new(self.llm.clone(), self.prompts.clone());
        let answer = or_cancelled(&self.cancel, synthesizer.synthesize(goal, &graph)).await??;
        self.memory.add_to_history(format!("Agent: {}", answer));
        Ok(answer)
    }
}
