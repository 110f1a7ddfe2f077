//! TaskGraph - the dependency graph of one run

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::task::{Task, TaskSpec, TaskStatus, ToolBinding};
use crate::events::PlannedTask;
use crate::prompts::{DependencyContext, TaskOutcome};
use crate::tools::{ToolRegistry, optional_tool_explanation};

/// Tasks keyed by unique ID, in plan order
///
/// Edges only reference IDs present in the graph. Only the scheduler mutates
/// status; each transition is checked so a terminal task is never re-entered.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    /// Build a graph, resolving each task's tool against `registry`
    ///
    /// Duplicate IDs keep the first occurrence; dependencies on unknown IDs
    /// are dropped.
    pub fn from_specs(specs: Vec<TaskSpec>, registry: &ToolRegistry) -> Self {
        debug!(spec_count = specs.len(), "TaskGraph::from_specs: called");
        let mut graph = Self::default();

        for spec in specs {
            if graph.index.contains_key(&spec.id) {
                warn!(task_id = %spec.id, "TaskGraph::from_specs: duplicate task id, keeping first");
                continue;
            }
            let binding = bind(&spec, registry);
            debug!(task_id = %spec.id, ?binding, "TaskGraph::from_specs: task bound");
            graph.index.insert(spec.id.clone(), graph.tasks.len());
            graph.tasks.push(Task::new(spec, binding));
        }

        let known: HashSet<String> = graph.index.keys().cloned().collect();
        for task in &mut graph.tasks {
            let mut seen = HashSet::new();
            let dropped = task.retain_dependencies(|dep| known.contains(dep) && seen.insert(dep.to_string()));
            for dep in dropped.iter().filter(|d| !known.contains(*d)) {
                debug!(task_id = %task.id(), %dep, "TaskGraph::from_specs: pruned dangling dependency");
            }
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in plan order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.index.get(id).map(|&i| &mut self.tasks[i])
    }

    fn ids_with(&self, status: TaskStatus) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id().to_string())
            .collect()
    }

    /// Pending tasks whose every dependency has completed
    pub fn ready_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| {
                t.dependencies()
                    .iter()
                    .all(|d| self.get(d).is_some_and(|dep| dep.status == TaskStatus::Completed))
            })
            .map(|t| t.id().to_string())
            .collect()
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.ids_with(TaskStatus::Pending)
    }

    pub fn running_ids(&self) -> Vec<String> {
        self.ids_with(TaskStatus::Running)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Every task has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// `Pending -> Running`
    pub fn mark_running(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::Running;
                true
            }
            other => {
                warn!(%id, status = ?other.map(|t| t.status), "TaskGraph::mark_running: invalid transition");
                false
            }
        }
    }

    /// `Running -> Completed`, storing the result
    pub fn mark_completed(&mut self, id: &str, result: String) -> bool {
        match self.get_mut(id) {
            Some(task) if task.status == TaskStatus::Running => {
                task.status = TaskStatus::Completed;
                task.result = Some(result);
                true
            }
            other => {
                warn!(%id, status = ?other.map(|t| t.status), "TaskGraph::mark_completed: invalid transition");
                false
            }
        }
    }

    /// `Running -> Failed`, storing the error
    pub fn mark_failed(&mut self, id: &str, error: String) -> bool {
        match self.get_mut(id) {
            Some(task) if task.status == TaskStatus::Running => {
                task.status = TaskStatus::Failed;
                task.error = Some(error);
                true
            }
            other => {
                warn!(%id, status = ?other.map(|t| t.status), "TaskGraph::mark_failed: invalid transition");
                false
            }
        }
    }

    /// Descriptions and results of a task's completed dependencies
    pub fn dependency_context(&self, id: &str) -> Vec<DependencyContext> {
        let Some(task) = self.get(id) else {
            return Vec::new();
        };
        task.dependencies()
            .iter()
            .filter_map(|d| self.get(d))
            .filter(|dep| dep.status == TaskStatus::Completed)
            .map(|dep| DependencyContext {
                description: dep.description().to_string(),
                result: dep.result().unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Terminal outcomes in plan order, for the final synthesis prompt
    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        self.tasks
            .iter()
            .filter(|t| t.status.is_terminal())
            .map(|t| TaskOutcome {
                description: t.description().to_string(),
                result: t.result().unwrap_or_default().to_string(),
                failed: t.status == TaskStatus::Failed,
                error: t.error().unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Task summaries for the plan announcement
    pub fn planned(&self) -> Vec<PlannedTask> {
        self.tasks
            .iter()
            .map(|t| PlannedTask {
                id: t.id().to_string(),
                description: t.description().to_string(),
                tool: match t.binding() {
                    ToolBinding::Synthesis => None,
                    _ => t.tool().map(String::from),
                },
                dependencies: t.dependencies().to_vec(),
            })
            .collect()
    }

    /// Split stuck pending tasks into those with a failed ancestor and the rest
    ///
    /// The rest can only be waiting on a dependency cycle.
    pub fn stall_report(&self) -> (Vec<String>, Vec<String>) {
        let (blocked, unresolved): (Vec<String>, Vec<String>) = self
            .pending_ids()
            .into_iter()
            .partition(|id| self.has_failed_ancestor(id));
        debug!(?blocked, ?unresolved, "TaskGraph::stall_report: classified");
        (blocked, unresolved)
    }

    fn has_failed_ancestor(&self, id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(task) = self.get(current) else {
                continue;
            };
            for dep in task.dependencies() {
                if self.get(dep).is_some_and(|d| d.status == TaskStatus::Failed) {
                    return true;
                }
                stack.push(dep.as_str());
            }
        }
        false
    }

    /// A dependency cycle, as a path of IDs ending where it started
    ///
    /// Nodes that only lead into the cycle are not part of the path.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        debug!("TaskGraph::find_cycle: called");
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task in &self.tasks {
            if !visited.contains(task.id()) && self.has_cycle_dfs(task.id(), &mut visited, &mut rec_stack, &mut path) {
                // The DFS path ends with the repeated node; drop the lead-in
                let start = path
                    .last()
                    .and_then(|repeated| path.iter().position(|id| id == repeated))
                    .unwrap_or(0);
                return Some(path.split_off(start));
            }
        }
        None
    }

    fn has_cycle_dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<String>,
    ) -> bool {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node.to_string());

        if let Some(task) = self.get(node) {
            for dep in task.dependencies() {
                if !visited.contains(dep.as_str()) {
                    if self.has_cycle_dfs(dep, visited, rec_stack, path) {
                        return true;
                    }
                } else if rec_stack.contains(dep.as_str()) {
                    path.push(dep.clone());
                    return true;
                }
            }
        }

        rec_stack.remove(node);
        path.pop();
        false
    }
}

fn bind(spec: &TaskSpec, registry: &ToolRegistry) -> ToolBinding {
    if spec.is_synthesis() {
        return ToolBinding::Synthesis;
    }
    let name = spec.tool.clone().unwrap_or_default();
    if let Some(tool) = registry.get(&name) {
        return ToolBinding::Tool(tool);
    }
    match optional_tool_explanation(&name) {
        Some(explanation) => ToolBinding::Optional { name, explanation },
        None => ToolBinding::Missing(name),
    }
}
