//! Tool contract and registry
//!
//! Tools are the only way a run touches the outside world. Each run gets a
//! [`ToolContext`] scoped to its working directory and carrying the run's
//! cancellation token; tools cannot escape the directory sandbox.

mod context;
mod error;
mod registry;
mod schema;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::{OPTIONAL_TOOLS, ToolRegistry, optional_tool_explanation};
pub use schema::validate_params;
pub use traits::{Tool, required_str};
