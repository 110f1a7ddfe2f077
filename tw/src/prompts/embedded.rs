//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");
pub const DECOMPOSE: &str = include_str!("../../prompts/decompose.pmt");
pub const TASK: &str = include_str!("../../prompts/task.pmt");
pub const SYNTHESIZE: &str = include_str!("../../prompts/synthesize.pmt");
pub const CONVERSATION: &str = include_str!("../../prompts/conversation.pmt");
pub const FOLLOWUP: &str = include_str!("../../prompts/followup.pmt");

/// Names of every embedded template
pub const NAMES: &[&str] = &["classify", "decompose", "task", "synthesize", "conversation", "followup"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "classify" => Some(CLASSIFY),
        "decompose" => Some(DECOMPOSE),
        "task" => Some(TASK),
        "synthesize" => Some(SYNTHESIZE),
        "conversation" => Some(CONVERSATION),
        "followup" => Some(FOLLOWUP),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
