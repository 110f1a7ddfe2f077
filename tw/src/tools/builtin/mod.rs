//! Built-in tools shipped with the binary

use crate::tools::{ToolContext, ToolError};

mod file_search;
mod file_write;
mod grep_search;
mod list_dir;
mod read_file;
mod web_search;

pub use file_search::FileSearchTool;
pub use file_write::FileWriteTool;
pub use grep_search::GrepSearchTool;
pub use list_dir::ListDirTool;
pub use read_file::ReadFileTool;
pub use web_search::WebSearchTool;

/// Run a synchronous directory walk off the async workers
///
/// The closure gets its own copy of the context so it can poll cancellation
/// between entries.
async fn run_blocking<F>(ctx: &ToolContext, work: F) -> Result<String, ToolError>
where
    F: FnOnce(&ToolContext) -> Result<String, ToolError> + Send + 'static,
{
    let ctx = ctx.clone();
    tokio::task::spawn_blocking(move || work(&ctx))
        .await
        .map_err(|e| ToolError::Failed(format!("search task failed: {}", e)))?
}
