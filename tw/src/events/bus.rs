//! Event Bus - central pub/sub system for run events
//!
//! The EventBus uses a tokio broadcast channel to deliver events to all
//! subscribers. Components emit events, consumers (the progress renderer)
//! subscribe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{PlannedTask, RunEvent, summarize};

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Maximum characters of a result or tool input carried in an event
const SUMMARY_CHARS: usize = 120;

/// Central event bus for run activity
pub struct EventBus {
    tx: broadcast::Sender<RunEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// This is fire-and-forget: if there are no subscribers, the event is dropped.
    pub fn emit(&self, event: RunEvent) {
        debug!(event_type = event.event_type(), run_id = event.run_id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle bound to one run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for components to emit events without owning the bus
///
/// Cheap to clone; every event carries the emitter's run ID.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<RunEvent>,
    run_id: String,
}

impl EventEmitter {
    /// An emitter whose events go nowhere
    pub fn detached(run_id: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            run_id: run_id.into(),
        }
    }

    /// Get the run ID this emitter is bound to
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: RunEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn run_started(&self, goal: &str, mode: &str) {
        self.emit(RunEvent::RunStarted {
            run_id: self.run_id.clone(),
            goal: goal.to_string(),
            mode: mode.to_string(),
        });
    }

    pub fn classified(&self, complexity: &str) {
        self.emit(RunEvent::Classified {
            run_id: self.run_id.clone(),
            complexity: complexity.to_string(),
        });
    }

    pub fn plan_created(&self, tasks: Vec<PlannedTask>) {
        self.emit(RunEvent::PlanCreated {
            run_id: self.run_id.clone(),
            tasks,
        });
    }

    pub fn task_started(&self, task_id: &str, description: &str) {
        self.emit(RunEvent::TaskStarted {
            run_id: self.run_id.clone(),
            task_id: task_id.to_string(),
            description: description.to_string(),
        });
    }

    pub fn task_completed(&self, task_id: &str, result: &str) {
        self.emit(RunEvent::TaskCompleted {
            run_id: self.run_id.clone(),
            task_id: task_id.to_string(),
            result_summary: summarize(result, SUMMARY_CHARS),
        });
    }

    pub fn task_failed(&self, task_id: &str, error: &str) {
        self.emit(RunEvent::TaskFailed {
            run_id: self.run_id.clone(),
            task_id: task_id.to_string(),
            error: error.to_string(),
        });
    }

    pub fn tool_invoked(&self, tool_name: &str, input: &str, success: bool, duration_ms: u64) {
        self.emit(RunEvent::ToolInvoked {
            run_id: self.run_id.clone(),
            tool_name: tool_name.to_string(),
            input_summary: summarize(input, SUMMARY_CHARS),
            success,
            duration_ms,
        });
    }

    pub fn synthesizing(&self, completed: usize, failed: usize) {
        self.emit(RunEvent::Synthesizing {
            run_id: self.run_id.clone(),
            completed,
            failed,
        });
    }

    pub fn run_completed(&self, success: bool, duration_ms: u64) {
        self.emit(RunEvent::RunCompleted {
            run_id: self.run_id.clone(),
            success,
            duration_ms,
        });
    }

    pub fn warning(&self, context: &str, message: &str) {
        self.emit(RunEvent::Warning {
            run_id: self.run_id.clone(),
            context: context.to_string(),
            message: message.to_string(),
        });
    }
}

/// Create a shared event bus
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
