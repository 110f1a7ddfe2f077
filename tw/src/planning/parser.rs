//! Line-protocol parser for model-written plans
//!
//! A plan is a sequence of blocks, each opened by a `TASK:` line and
//! followed by `TYPE:`, `DESCRIPTION:`, `TOOL:`, `INPUT:` and
//! `DEPENDENCIES:` lines in any order. The reply is untrusted: unknown lines
//! are ignored, repeated fields keep the last value, and malformed blocks are
//! dropped during validation. Keys are matched in upper case only, so prose
//! such as `Task: ...` never opens a block. Nothing in here can panic on bad
//! input.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::graph::{TaskSpec, TaskType};

/// One block exactly as the model wrote it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTask {
    pub id: Option<String>,
    pub task_type: Option<String>,
    pub description: Option<String>,
    pub tool: Option<String>,
    pub input: Option<String>,
    pub dependencies: Option<String>,
}

/// Split a reply into raw blocks
///
/// A block is committed when the next `TASK:` line or the end of the reply
/// is reached. Field lines before the first `TASK:` are ignored.
pub fn parse_blocks(reply: &str) -> Vec<RawTask> {
    debug!(reply_len = reply.len(), "parse_blocks: called");
    let mut blocks = Vec::new();
    let mut current: Option<RawTask> = None;

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());

        match key.trim() {
            "TASK" => {
                if let Some(done) = current.take() {
                    blocks.push(done);
                }
                current = Some(RawTask {
                    id: value,
                    ..Default::default()
                });
            }
            field => {
                let Some(task) = current.as_mut() else {
                    continue;
                };
                match field {
                    "TYPE" => task.task_type = value,
                    "DESCRIPTION" => task.description = value,
                    "TOOL" => task.tool = value,
                    "INPUT" => task.input = value,
                    "DEPENDENCIES" => task.dependencies = value,
                    _ => {}
                }
            }
        }
    }

    if let Some(done) = current {
        blocks.push(done);
    }
    debug!(block_count = blocks.len(), "parse_blocks: done");
    blocks
}

/// Parse a `DEPENDENCIES:` value; `none` or empty means no dependencies
pub fn parse_dependencies(value: Option<&str>) -> Vec<String> {
    match value.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(v) if v.eq_ignore_ascii_case("none") => Vec::new(),
        Some(v) => v
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("none"))
            .map(String::from)
            .collect(),
    }
}

/// Tool names the planner may not use, with the tool each is rewritten to
///
/// A `None` substitute rejects the task outright.
pub type ExcludedTools<'a> = &'a [(&'a str, Option<&'a str>)];

/// Validate raw blocks into task specs, dropping what cannot be used
///
/// Drops blocks without an ID or description, blocks without a tool unless
/// they are `response_generation`, and duplicate IDs after the first.
/// Excluded tools are rewritten to their substitute or rejected.
pub fn validate_blocks(blocks: Vec<RawTask>, excluded: ExcludedTools<'_>) -> Vec<TaskSpec> {
    debug!(block_count = blocks.len(), "validate_blocks: called");
    let mut seen = HashSet::new();
    let mut specs = Vec::new();

    for block in blocks {
        let Some(id) = block.id else {
            warn!("validate_blocks: dropping block without TASK id");
            continue;
        };
        let Some(description) = block.description else {
            warn!(%id, "validate_blocks: dropping task without description");
            continue;
        };

        let task_type = match block.task_type.as_deref().map(str::parse::<TaskType>) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                debug!(%id, %e, "validate_blocks: unrecognized type, treating as information_retrieval");
                TaskType::InformationRetrieval
            }
            None => TaskType::InformationRetrieval,
        };

        let mut tool = block.tool;
        if let Some(name) = tool.as_deref()
            && let Some((_, substitute)) = excluded.iter().find(|(ex, _)| *ex == name)
        {
            match substitute {
                Some(sub) => {
                    debug!(%id, from = %name, to = %sub, "validate_blocks: rewriting excluded tool");
                    tool = Some(sub.to_string());
                }
                None => {
                    warn!(%id, tool = %name, "validate_blocks: dropping task using excluded tool");
                    continue;
                }
            }
        }

        if tool.is_none() && task_type != TaskType::ResponseGeneration {
            warn!(%id, "validate_blocks: dropping task without tool");
            continue;
        }

        if !seen.insert(id.clone()) {
            warn!(%id, "validate_blocks: skipping duplicate task id");
            continue;
        }

        specs.push(TaskSpec {
            id,
            task_type,
            description,
            input: block.input.unwrap_or_default(),
            tool,
            dependencies: parse_dependencies(block.dependencies.as_deref()),
        });
    }

    debug!(valid_count = specs.len(), "validate_blocks: done");
    specs
}
