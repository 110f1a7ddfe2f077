//! Complexity classification - routes a goal to planning or the loop

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{LlmClient, strip_think_blocks};
use crate::prompts::PromptLoader;

/// How much coordination a goal needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// One tool call or one lookup; handled by the conversational loop
    Simple,
    /// Several coordinated steps; decomposed into a task graph
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Complex => write!(f, "complex"),
        }
    }
}

pub struct Classifier {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self { llm, prompts }
    }

    /// Classify a goal, falling back to [`Complexity::Simple`] on any failure
    pub async fn classify(&self, goal: &str) -> Complexity {
        debug!(%goal, "Classifier::classify: called");
        let prompt = match self.prompts.render("classify", &serde_json::json!({ "query": goal })) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render classify prompt, treating goal as simple");
                return Complexity::Simple;
            }
        };

        match self.llm.complete(&prompt).await {
            Ok(reply) => parse_complexity(&reply),
            Err(e) => {
                warn!(error = %e, "Classification failed, treating goal as simple");
                Complexity::Simple
            }
        }
    }
}

/// Anything mentioning COMPLEX outside a think block counts as complex
pub fn parse_complexity(reply: &str) -> Complexity {
    if strip_think_blocks(reply).to_uppercase().contains("COMPLEX") {
        Complexity::Complex
    } else {
        Complexity::Simple
    }
}
