//! Parsing of `ACTION:`/`INPUT:` pairs out of model replies

use serde_json::{Map, Value};

use crate::llm::strip_think_blocks;

/// A tool call proposed by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub tool: String,
    pub input: String,
}

impl Action {
    /// Structured parameters, when the input is a JSON object
    pub fn params(&self) -> Option<Map<String, Value>> {
        let trimmed = self.input.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// What a reply asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Run a tool and feed the result back
    Act(Action),
    /// The reply is the answer
    Answer(String),
}

/// Classify a raw model reply
///
/// Think blocks are stripped first. An `ACTION:` line only counts when the
/// line right after it starts with `INPUT:`; otherwise the search continues
/// and a reply without a complete pair is the final answer.
pub fn parse_reply(raw: &str) -> Reply {
    let cleaned = strip_think_blocks(raw);
    let lines: Vec<&str> = cleaned.lines().map(str::trim).collect();

    for (i, line) in lines.iter().enumerate() {
        let Some(tool) = line.strip_prefix("ACTION:") else {
            continue;
        };
        if let Some(input) = lines.get(i + 1).and_then(|next| next.strip_prefix("INPUT:")) {
            return Reply::Act(Action {
                tool: tool.trim().to_string(),
                input: input.trim().to_string(),
            });
        }
    }

    Reply::Answer(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(tool: &str, input: &str) -> Reply {
        Reply::Act(Action {
            tool: tool.to_string(),
            input: input.to_string(),
        })
    }

    #[test]
    fn test_plain_answer() {
        assert_eq!(parse_reply("4"), Reply::Answer("4".to_string()));
    }

    #[test]
    fn test_action_after_think_block() {
        assert_eq!(
            parse_reply("<think>ignored</think>ACTION: x\nINPUT: y"),
            act("x", "y")
        );
    }

    #[test]
    fn test_action_with_preamble_and_indent() {
        let reply = "Let me check.\n  ACTION: list_dir  \n  INPUT: .  \nthanks";
        assert_eq!(parse_reply(reply), act("list_dir", "."));
    }

    #[test]
    fn test_action_without_input_is_an_answer() {
        let reply = "ACTION: list_dir\n\nINPUT: .";
        assert_eq!(parse_reply(reply), Reply::Answer(reply.to_string()));
    }

    #[test]
    fn test_later_complete_pair_wins() {
        let reply = "ACTION: broken\nnope\nACTION: read_file\nINPUT: Cargo.toml";
        assert_eq!(parse_reply(reply), act("read_file", "Cargo.toml"));
    }

    #[test]
    fn test_action_inside_think_block_is_ignored() {
        let reply = "<think>ACTION: web_search\nINPUT: x</think>Paris";
        assert_eq!(parse_reply(reply), Reply::Answer("Paris".to_string()));
    }

    #[test]
    fn test_params_only_for_json_objects() {
        let structured = Action {
            tool: "read_file".to_string(),
            input: r#"{"target_file": "a.rs", "start_line": 2}"#.to_string(),
        };
        let params = structured.params().unwrap();
        assert_eq!(params["target_file"], "a.rs");

        let free_text = Action {
            tool: "read_file".to_string(),
            input: "a.rs".to_string(),
        };
        assert!(free_text.params().is_none());

        let array = Action {
            tool: "x".to_string(),
            input: "[1, 2]".to_string(),
        };
        assert!(array.params().is_none());
    }
}
