//! Execution of task graphs

mod dispatch;
mod scheduler;

pub use dispatch::{TaskJob, TaskRunner};
pub use scheduler::{CANCELLED_TASK_ERROR, Scheduler};
