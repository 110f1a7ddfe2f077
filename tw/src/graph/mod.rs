//! Task graph
//!
//! Typed tasks with dependency edges, created fresh per goal by planning,
//! driven to completion by the executor, then read by synthesis.

mod dag;
mod task;

pub use dag::TaskGraph;
pub use task::{Task, TaskSpec, TaskStatus, TaskType, ToolBinding};
