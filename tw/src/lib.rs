//! taskweave - goal decomposition and dependency-ordered task execution
//!
//! An [`Agent`] takes a natural-language goal and answers it with a
//! completion backend and a set of tools. Simple goals go through a bounded
//! conversational loop; complex goals are broken into a task graph whose
//! independent tasks run concurrently, wave by wave, before a final answer
//! is synthesized from every task's outcome.
//!
//! # Modules
//!
//! - [`agent`] - entry point and routing
//! - [`classifier`] - simple/complex routing decision
//! - [`planning`] - decomposition of a goal into task specs
//! - [`graph`] - the task graph and its state transitions
//! - [`executor`] - wave scheduling and per-task dispatch
//! - [`synthesis`] - the final answer
//! - [`conversation`] - the bounded tool-chaining loop
//! - [`llm`] - completion backend contract and clients
//! - [`tools`] - tool contract, registry, and built-in tools
//! - [`events`] / [`progress`] - run events and their terminal rendering
//! - [`config`] / [`cli`] - configuration and command line

pub mod agent;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod planning;
pub mod progress;
pub mod prompts;
pub mod synthesis;
pub mod tools;

pub use agent::{Agent, AgentMode};
pub use classifier::{Classifier, Complexity};
pub use config::{AgentConfig, Config, LlmConfig, SearchConfig};
pub use conversation::{ConversationLoop, DEFAULT_MAX_CHAIN_LENGTH};
pub use error::AgentError;
pub use events::{EventBus, EventEmitter, PlannedTask, RunEvent, create_event_bus};
pub use executor::{Scheduler, TaskJob, TaskRunner};
pub use graph::{Task, TaskGraph, TaskSpec, TaskStatus, TaskType, ToolBinding};
pub use llm::{LlmClient, LlmError, OllamaClient, OpenAIClient, create_client, strip_think_blocks};
pub use memory::Memory;
pub use planning::{Decomposer, PlanningError};
pub use progress::ProgressRenderer;
pub use prompts::PromptLoader;
pub use synthesis::Synthesizer;
pub use tools::{Tool, ToolContext, ToolError, ToolRegistry};
