//! Event types for run activity streaming
//!
//! These events represent everything observable about a run:
//! - Run lifecycle (start, routing, completion)
//! - Planning (the task graph that was built)
//! - Task execution (start, completion, failure)
//! - Tool invocations from either control path

use serde::{Deserialize, Serialize};

/// Summary of one planned task, as announced when the graph is built
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub id: String,
    pub description: String,
    pub tool: Option<String>,
    pub dependencies: Vec<String>,
}

/// Core event enum - the vocabulary of run activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    // === Run Lifecycle ===
    /// A run has started
    RunStarted { run_id: String, goal: String, mode: String },
    /// The classifier routed the goal
    Classified { run_id: String, complexity: String },
    /// Decomposition produced a task graph
    PlanCreated { run_id: String, tasks: Vec<PlannedTask> },
    /// Final answer synthesis has started
    Synthesizing {
        run_id: String,
        completed: usize,
        failed: usize,
    },
    /// A run has finished
    RunCompleted {
        run_id: String,
        success: bool,
        duration_ms: u64,
    },

    // === Task Execution ===
    /// A task moved to running
    TaskStarted {
        run_id: String,
        task_id: String,
        description: String,
    },
    /// A task completed
    TaskCompleted {
        run_id: String,
        task_id: String,
        result_summary: String,
    },
    /// A task failed
    TaskFailed {
        run_id: String,
        task_id: String,
        error: String,
    },

    // === Tool Execution ===
    /// A tool was invoked
    ToolInvoked {
        run_id: String,
        tool_name: String,
        input_summary: String,
        success: bool,
        duration_ms: u64,
    },

    // === Warnings ===
    /// A recoverable anomaly
    Warning {
        run_id: String,
        context: String,
        message: String,
    },
}

impl RunEvent {
    /// Get the run ID for this event
    pub fn run_id(&self) -> &str {
        match self {
            RunEvent::RunStarted { run_id, .. }
            | RunEvent::Classified { run_id, .. }
            | RunEvent::PlanCreated { run_id, .. }
            | RunEvent::Synthesizing { run_id, .. }
            | RunEvent::RunCompleted { run_id, .. }
            | RunEvent::TaskStarted { run_id, .. }
            | RunEvent::TaskCompleted { run_id, .. }
            | RunEvent::TaskFailed { run_id, .. }
            | RunEvent::ToolInvoked { run_id, .. }
            | RunEvent::Warning { run_id, .. } => run_id,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            RunEvent::RunStarted { .. } => "RunStarted",
            RunEvent::Classified { .. } => "Classified",
            RunEvent::PlanCreated { .. } => "PlanCreated",
            RunEvent::Synthesizing { .. } => "Synthesizing",
            RunEvent::RunCompleted { .. } => "RunCompleted",
            RunEvent::TaskStarted { .. } => "TaskStarted",
            RunEvent::TaskCompleted { .. } => "TaskCompleted",
            RunEvent::TaskFailed { .. } => "TaskFailed",
            RunEvent::ToolInvoked { .. } => "ToolInvoked",
            RunEvent::Warning { .. } => "Warning",
        }
    }
}

/// Truncate text for event summaries, on a char boundary
pub fn summarize(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() { format!("{}...", head) } else { head }
}
