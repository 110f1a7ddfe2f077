//! Scheduler - wave-based execution of a task graph
//!
//! Each wave is the set of pending tasks whose dependencies have all
//! completed. A wave's tasks run concurrently (bounded by
//! `max_parallel`); the next wave is computed only after the whole wave has
//! settled. The scheduler is the only writer of task status, so transitions
//! happen on one task at a time without locking the graph.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::{TaskJob, TaskRunner};
use crate::error::AgentError;
use crate::events::EventEmitter;
use crate::graph::{TaskGraph, TaskStatus};

/// Error recorded on tasks abandoned by cancellation
pub const CANCELLED_TASK_ERROR: &str = "cancelled";

/// Drives a task graph to completion
pub struct Scheduler {
    runner: Arc<TaskRunner>,
    max_parallel: usize,
    events: EventEmitter,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(runner: Arc<TaskRunner>, max_parallel: usize, events: EventEmitter, cancel: CancellationToken) -> Self {
        Self {
            runner,
            max_parallel: max_parallel.max(1),
            events,
            cancel,
        }
    }

    /// Execute every reachable task
    ///
    /// Individual task failures are recorded on the graph and do not end
    /// execution. Returns `Ok` once no task is pending. When pending tasks
    /// remain but none can become ready, returns [`AgentError::Stalled`]
    /// naming the tasks blocked by a failed dependency separately from
    /// those stuck on a cycle. Cancellation fails every in-flight task and
    /// returns [`AgentError::Cancelled`].
    pub async fn execute(&self, graph: &mut TaskGraph) -> Result<(), AgentError> {
        debug!(task_count = graph.len(), max_parallel = self.max_parallel, "Scheduler::execute: called");
        let mut wave_number = 0;

        loop {
            if self.cancel.is_cancelled() {
                debug!("Scheduler::execute: cancelled before next wave");
                return Err(AgentError::Cancelled);
            }

            let ready = graph.ready_ids();
            if ready.is_empty() {
                if graph.pending_ids().is_empty() {
                    info!(
                        completed = graph.count(TaskStatus::Completed),
                        failed = graph.count(TaskStatus::Failed),
                        "Task graph finished"
                    );
                    return Ok(());
                }

                let (blocked, unresolved) = graph.stall_report();
                if let Some(cycle) = graph.find_cycle() {
                    warn!(cycle = %cycle.join(" -> "), "Dependency cycle in task graph");
                }
                warn!(?blocked, ?unresolved, "Task graph stalled");
                return Err(AgentError::Stalled { blocked, unresolved });
            }

            wave_number += 1;
            info!(wave = wave_number, tasks = ?ready, "Starting wave");
            self.run_wave(graph, ready).await?;
        }
    }

    async fn run_wave(&self, graph: &mut TaskGraph, ready: Vec<String>) -> Result<(), AgentError> {
        let mut queue: VecDeque<TaskJob> = ready.iter().filter_map(|id| TaskJob::from_graph(graph, id)).collect();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.max_parallel {
                let Some(job) = queue.pop_front() else {
                    break;
                };
                if !graph.mark_running(&job.id) {
                    continue;
                }
                self.events.task_started(&job.id, &job.description);
                let runner = &self.runner;
                in_flight.push(async move {
                    let result = runner.run(&job).await;
                    (job.id, result)
                });
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.abandon_running(graph);
                    return Err(AgentError::Cancelled);
                }
                next = in_flight.next() => next,
            };

            let Some((id, result)) = next else {
                debug!("Scheduler::run_wave: wave settled");
                return Ok(());
            };

            match result {
                Ok(output) => {
                    info!(task_id = %id, "Task completed");
                    self.events.task_completed(&id, &output);
                    graph.mark_completed(&id, output);
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(task_id = %id, error = %message, "Task failed");
                    self.events.task_failed(&id, &message);
                    graph.mark_failed(&id, message);
                }
            }
        }
    }

    /// Fail every running task; their futures are dropped by the caller
    fn abandon_running(&self, graph: &mut TaskGraph) {
        for id in graph.running_ids() {
            warn!(task_id = %id, "Abandoning in-flight task");
            graph.mark_failed(&id, CANCELLED_TASK_ERROR.to_string());
            self.events.task_failed(&id, CANCELLED_TASK_ERROR);
        }
    }
}
