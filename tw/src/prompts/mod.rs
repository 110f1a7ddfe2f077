//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files.
//!
//! Template loading chain:
//! 1. `.taskweave/prompts/{name}.pmt` in the working directory (user override)
//! 2. Embedded fallback compiled from `prompts/`
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DependencyContext, OVERRIDE_DIR, PromptLoader, TaskOutcome};
