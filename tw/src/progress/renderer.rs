//! ProgressRenderer - prints run events for a terminal user

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::{EventBus, RunEvent, summarize};

const RESULT_PREVIEW_CHARS: usize = 80;

/// Renders task state transitions; verbose mode adds tools and warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressRenderer {
    verbose: bool,
}

impl ProgressRenderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Lines to print for one event, if any
    pub fn render(&self, event: &RunEvent) -> Vec<String> {
        match event {
            RunEvent::RunStarted { goal, mode, .. } => {
                vec![format!("{} {} ({})", "▶".bold(), goal.bold(), mode)]
            }
            RunEvent::Classified { complexity, .. } => {
                vec![format!("  {} {}", "goal is".dimmed(), complexity.cyan())]
            }
            RunEvent::PlanCreated { tasks, .. } => {
                let mut lines = vec![format!("  {} {} tasks", "plan:".dimmed(), tasks.len())];
                for task in tasks {
                    let deps = if task.dependencies.is_empty() {
                        String::new()
                    } else {
                        format!(" after {}", task.dependencies.join(", "))
                    };
                    lines.push(format!(
                        "  {} {:<10} {}{}",
                        "pending  ".dimmed(),
                        task.id,
                        task.description,
                        deps.dimmed()
                    ));
                }
                lines
            }
            RunEvent::TaskStarted {
                task_id, description, ..
            } => vec![format!("  {} {:<10} {}", "running  ".yellow(), task_id, description)],
            RunEvent::TaskCompleted {
                task_id, result_summary, ..
            } => vec![format!(
                "  {} {:<10} {}",
                "completed".green(),
                task_id,
                summarize(&one_line(result_summary), RESULT_PREVIEW_CHARS).dimmed()
            )],
            RunEvent::TaskFailed { task_id, error, .. } => {
                vec![format!("  {} {:<10} {}", "failed   ".red(), task_id, error.red())]
            }
            RunEvent::Synthesizing { completed, failed, .. } => vec![format!(
                "  {} from {} completed, {} failed",
                "synthesizing".dimmed(),
                completed,
                failed
            )],
            RunEvent::ToolInvoked {
                tool_name,
                input_summary,
                success,
                duration_ms,
                ..
            } if self.verbose => {
                let status = if *success { "ok".green() } else { "error".red() };
                vec![format!(
                    "  {} {} {}({}) {} in {}ms",
                    timestamp().dimmed(),
                    "tool".blue(),
                    tool_name,
                    one_line(input_summary),
                    status,
                    duration_ms
                )]
            }
            RunEvent::Warning { context, message, .. } if self.verbose => {
                vec![format!("  {} {} {}: {}", timestamp().dimmed(), "warning".yellow(), context, message)]
            }
            RunEvent::RunCompleted { success, duration_ms, .. } => {
                let status = if *success { "done".green().bold() } else { "failed".red().bold() };
                vec![format!("{} {} in {:.1}s", "■".bold(), status, *duration_ms as f64 / 1000.0)]
            }
            _ => Vec::new(),
        }
    }

    /// Print events to stderr until a run completes or the bus closes
    pub async fn run(self, mut rx: broadcast::Receiver<RunEvent>) {
        debug!(verbose = self.verbose, "ProgressRenderer::run: called");
        let mut stderr = std::io::stderr();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = matches!(event, RunEvent::RunCompleted { .. });
                    for line in self.render(&event) {
                        let _ = writeln!(stderr, "{}", line);
                    }
                    if done {
                        debug!("ProgressRenderer::run: run completed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "ProgressRenderer: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("ProgressRenderer: channel closed, shutting down");
                    break;
                }
            }
        }
    }
}

/// Spawn a renderer subscribed to `bus`
///
/// Subscribes before returning, so no event emitted afterwards is missed.
pub fn spawn_progress_renderer(bus: &Arc<EventBus>, verbose: bool) -> tokio::task::JoinHandle<()> {
    let rx = bus.subscribe();
    tokio::spawn(ProgressRenderer::new(verbose).run(rx))
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PlannedTask;

    fn plain() {
        colored::control::set_override(false);
    }

    fn tool_event() -> RunEvent {
        RunEvent::ToolInvoked {
            run_id: "r".to_string(),
            tool_name: "read_file".to_string(),
            input_summary: "notes.txt".to_string(),
            success: true,
            duration_ms: 3,
        }
    }

    #[test]
    fn test_plan_lists_pending_tasks() {
        plain();
        let event = RunEvent::PlanCreated {
            run_id: "r".to_string(),
            tasks: vec![
                PlannedTask {
                    id: "t1".to_string(),
                    description: "Look up the venue".to_string(),
                    tool: Some("web_search".to_string()),
                    dependencies: vec![],
                },
                PlannedTask {
                    id: "t2".to_string(),
                    description: "Answer".to_string(),
                    tool: None,
                    dependencies: vec!["t1".to_string()],
                },
            ],
        };

        let lines = ProgressRenderer::new(false).render(&event);

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("pending") && lines[1].contains("Look up the venue"));
        assert!(lines[2].ends_with("after t1"));
    }

    #[test]
    fn test_task_transitions() {
        plain();
        let renderer = ProgressRenderer::new(false);
        let started = RunEvent::TaskStarted {
            run_id: "r".to_string(),
            task_id: "t1".to_string(),
            description: "Look up the venue".to_string(),
        };
        let completed = RunEvent::TaskCompleted {
            run_id: "r".to_string(),
            task_id: "t1".to_string(),
            result_summary: "Lisbon\nPortugal".to_string(),
        };
        let failed = RunEvent::TaskFailed {
            run_id: "r".to_string(),
            task_id: "t2".to_string(),
            error: "Tool not found: teleport".to_string(),
        };

        assert!(renderer.render(&started)[0].contains("running"));
        let done = &renderer.render(&completed)[0];
        assert!(done.contains("completed") && done.contains("Lisbon Portugal"));
        assert!(renderer.render(&failed)[0].contains("Tool not found: teleport"));
    }

    #[test]
    fn test_tools_and_warnings_only_when_verbose() {
        plain();
        let warning = RunEvent::Warning {
            run_id: "r".to_string(),
            context: "t1".to_string(),
            message: "web_search is not available".to_string(),
        };

        assert!(ProgressRenderer::new(false).render(&tool_event()).is_empty());
        assert!(ProgressRenderer::new(false).render(&warning).is_empty());

        let verbose = ProgressRenderer::new(true);
        let line = &verbose.render(&tool_event())[0];
        assert!(line.contains("read_file(notes.txt) ok in 3ms"));
        assert!(verbose.render(&warning)[0].contains("warning t1: web_search is not available"));
    }

    #[tokio::test]
    async fn test_run_stops_after_completion() {
        let bus = Arc::new(EventBus::new(16));
        let handle = spawn_progress_renderer(&bus, false);

        let emitter = bus.emitter_for("r");
        emitter.run_started("goal", "orchestrated");
        emitter.run_completed(true, 10);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("renderer should stop")
            .unwrap();
    }
}
