//! Claude Code hook entrypoint.
//!
//! `steward hook` is registered for the hook events below and receives one
//! JSON payload per invocation on stdin. Audit state lives under
//! `<sessions_root>/<project-slug>-<claude session id>/`.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde_json::Value;
use steward_store::StewardConfig;

use crate::hooks::SessionHooks;
use crate::setup::PREVIOUS_CONTEXT_HEADING;

/// Longest assistant reply recorded from a `Stop` event, `...` included.
pub const STOP_MESSAGE_CHARS: usize = 2000;

/// What the hook prints. `stdout` is consumed by Claude Code.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HookResult {
    pub stdout: Option<String>,
}

impl HookResult {
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Parse stdin and dispatch by `hook_event_name`.
pub fn hook_entrypoint_from_stdin(config: &StewardConfig, stdin: &str) -> anyhow::Result<HookResult> {
    if stdin.trim().is_empty() {
        return Ok(HookResult::empty());
    }
    let raw: Value = serde_json::from_str(stdin)?;

    let hook_event_name = get_str(&raw, "hook_event_name");
    let claude_session_id = get_str(&raw, "session_id");
    let transcript_path = get_str(&raw, "transcript_path");
    let cwd = get_str(&raw, "cwd");
    let source = get_str(&raw, "source");

    if claude_session_id.is_empty() {
        anyhow::bail!("hook payload for {hook_event_name:?} has no session_id");
    }
    let project_name = project_name_from_cwd(&cwd);
    let session_id = format!(
        "{}-{}",
        steward_store::project_slug(&project_name),
        claude_session_id
    );
    tracing::debug!(event = %hook_event_name, %session_id, "hook received");

    // PreCompact cannot return context to Claude Code. The supervisor it
    // persists is injected by the SessionStart(compact) that follows.
    match hook_event_name.as_str() {
        "SessionStart" => {
            dispatch_session_start(config, &project_name, &session_id, &cwd, &source)
        }
        "PostToolUse" => {
            let mut hooks = SessionHooks::open(config, &session_id, &cwd);
            let tool_name = get_str(&raw, "tool_name");
            let input = get_value(&raw, "tool_input");
            let response = get_value(&raw, "tool_response");
            hooks.on_tool_use(&tool_name, &input, &response);
            Ok(HookResult::empty())
        }
        "UserPromptSubmit" => {
            let mut hooks = SessionHooks::open(config, &session_id, &cwd);
            hooks.on_user_prompt(&get_str(&raw, "prompt"));
            Ok(HookResult::empty())
        }
        "Stop" => {
            let mut hooks = SessionHooks::open(config, &session_id, &cwd);
            if let Some(text) = non_empty(&transcript_path)
                .and_then(|p| steward_supervisor::last_assistant_reply(Path::new(p), STOP_MESSAGE_CHARS))
            {
                hooks.on_agent_message(&text);
            }
            Ok(HookResult::empty())
        }
        "PreCompact" | "SessionEnd" => {
            let hooks = SessionHooks::open(config, &session_id, &cwd);
            let transcript = non_empty(&transcript_path)
                .and_then(|p| steward_supervisor::transcript_from_jsonl(Path::new(p)));
            hooks.on_pre_compact(transcript.as_deref());
            Ok(HookResult::empty())
        }
        _ => Ok(HookResult::empty()),
    }
}

/// Inject a supervisor context at session start.
///
/// `compact` and `resume` continue the same session, so they get that
/// session's own `last_supervisor.txt`. `startup`, `clear` and anything else
/// begin fresh and get the newest context left by another session of the
/// project.
fn dispatch_session_start(
    config: &StewardConfig,
    project_name: &str,
    session_id: &str,
    cwd: &str,
    source: &str,
) -> anyhow::Result<HookResult> {
    // materialize this session's audit.json
    let hooks = SessionHooks::open(config, session_id, cwd);

    let context = match source {
        "compact" | "resume" => hooks
            .supervisor()
            .load_supervisor_context()
            .filter(|text| !text.trim().is_empty()),
        _ => previous_supervisor_context(config, project_name, session_id),
    };
    let Some(previous) = context else {
        tracing::debug!(%session_id, source, "no supervisor context to inject");
        return Ok(HookResult::empty());
    };
    let output = serde_json::json!({
        "hookSpecificOutput": {
            "hookEventName": "SessionStart",
            "additionalContext": format!("{PREVIOUS_CONTEXT_HEADING}\n{previous}")
        }
    });
    Ok(HookResult::output(serde_json::to_string(&output)?))
}

/// Newest `last_supervisor.txt` among the project's other sessions.
pub fn previous_supervisor_context(
    config: &StewardConfig,
    project_name: &str,
    current_session_id: &str,
) -> Option<String> {
    let current = config.session_dir(current_session_id);
    let mut newest: Option<(SystemTime, std::path::PathBuf)> = None;
    for dir in steward_store::project_sessions(config, project_name) {
        if dir == current {
            continue;
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let path = config.latest_supervisor_path(name);
        let Some(mtime) = fs::metadata(&path).ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(best, _)| mtime > *best) {
            newest = Some((mtime, path));
        }
    }
    let (_, path) = newest?;
    match fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            None
        }
    }
}

/// Last path component of `cwd`, falling back to the process directory.
pub fn project_name_from_cwd(cwd: &str) -> String {
    let path = if cwd.is_empty() {
        std::env::current_dir().unwrap_or_default()
    } else {
        std::path::PathBuf::from(cwd)
    };
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string())
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Get a string field, trying snake_case first then camelCase.
pub(crate) fn get_str(v: &Value, snake_key: &str) -> String {
    if let Some(s) = v.get(snake_key).and_then(|x| x.as_str()) {
        return s.to_string();
    }
    v.get(snake_to_camel(snake_key))
        .and_then(|x| x.as_str())
        .unwrap_or("")
        .to_string()
}

/// Like [`get_str`] for arbitrary JSON; missing fields are `Null`.
pub(crate) fn get_value(v: &Value, snake_key: &str) -> Value {
    v.get(snake_key)
        .or_else(|| v.get(snake_to_camel(snake_key)))
        .cloned()
        .unwrap_or(Value::Null)
}

pub(crate) fn snake_to_camel(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for ch in s.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}
