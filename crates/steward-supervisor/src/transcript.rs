//! Read Claude Code JSONL transcripts.
//!
//! Expected format per line:
//! ```json
//! {"type":"user","message":{"content":"hello"}}
//! {"type":"assistant","message":{"content":[{"type":"text","text":"..."},{"type":"tool_use","name":"Bash","input":{...}}]}}
//! ```

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use steward_store::truncate_chars;

use crate::analyze::{ASSISTANT_MARKER, USER_MARKER};

const ELLIPSIS: &str = "...";

/// One conversational turn recovered from a transcript line.
#[derive(Debug, PartialEq)]
enum Turn {
    User(String),
    Assistant {
        text: String,
        tools: Vec<(String, Value)>,
    },
}

impl Turn {
    fn from_line(line: &str) -> Option<Self> {
        let parsed: Value = serde_json::from_str(line).ok()?;
        let content = parsed.get("message").and_then(|m| m.get("content"));
        match parsed.get("type")?.as_str()? {
            "user" => {
                let text = match content? {
                    Value::String(s) => s.clone(),
                    Value::Array(blocks) => joined_text(blocks),
                    _ => return None,
                };
                Some(Turn::User(text))
            }
            "assistant" => {
                let blocks = content?.as_array()?;
                let tools = blocks
                    .iter()
                    .filter(|b| block_type(b) == Some("tool_use"))
                    .map(|b| {
                        let name = b.get("name").and_then(Value::as_str).unwrap_or("tool");
                        (name.to_string(), b.get("input").cloned().unwrap_or(Value::Null))
                    })
                    .collect();
                Some(Turn::Assistant {
                    text: joined_text(blocks),
                    tools,
                })
            }
            _ => None,
        }
    }
}

/// Every recognizable turn in the file, in order. Blank and malformed lines
/// are skipped; reading stops at the first I/O error.
fn read_turns(path: &Path) -> Option<Vec<Turn>> {
    let file = std::fs::File::open(path).ok()?;
    let turns = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| Turn::from_line(&line))
        .collect();
    Some(turns)
}

/// Convert a JSONL transcript into `Human:` / `Assistant:` text suitable for
/// the supervisor. Tool calls become `Tool: <name> <input>` lines so file
/// paths and commands stay visible to the scan. Malformed lines are skipped.
///
/// Returns `None` if the file cannot be opened.
pub fn transcript_from_jsonl(path: &Path) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    for turn in read_turns(path)? {
        match turn {
            Turn::User(text) => {
                if !text.trim().is_empty() {
                    out.push(format!("{USER_MARKER} {text}"));
                }
            }
            Turn::Assistant { text, tools } => {
                if !text.trim().is_empty() {
                    out.push(format!("{ASSISTANT_MARKER} {text}"));
                }
                out.extend(tools.iter().map(|(name, input)| format!("Tool: {name} {input}")));
            }
        }
    }
    Some(out.join("\n"))
}

/// The newest assistant turn that carries text. The result never exceeds
/// `max_chars` characters; a cut reply ends in `...`.
pub fn last_assistant_reply(path: &Path, max_chars: usize) -> Option<String> {
    let reply = read_turns(path)?.into_iter().rev().find_map(|turn| match turn {
        Turn::Assistant { text, .. } if !text.is_empty() => Some(text),
        _ => None,
    })?;
    Some(clip(reply, max_chars))
}

fn clip(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    format!("{}{ELLIPSIS}", truncate_chars(&text, keep))
}

fn block_type(block: &Value) -> Option<&str> {
    block.get("type").and_then(Value::as_str)
}

fn joined_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter(|b| block_type(b) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
