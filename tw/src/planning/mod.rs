//! Planning: goal decomposition into a task graph

mod decomposer;
mod error;
mod parser;

pub use decomposer::{Decomposer, EXCLUDED_TOOLS, needs_web_search};
pub use error::PlanningError;
pub use parser::{ExcludedTools, RawTask, parse_blocks, parse_dependencies, validate_blocks};
